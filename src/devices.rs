//! AVFoundation device discovery.
//!
//! This module parses FFmpeg's `-list_devices` diagnostic output into video
//! and audio device lists, extracts screen capture devices, and classifies
//! device indices as screen or camera devices.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::platform::DeviceQuery;
use crate::task::TaskError;

/// Whether a capture device represents a whole display or a camera/input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Screen,
    Camera,
}

impl DeviceKind {
    /// Screen devices sit at or above `threshold` in AVFoundation's numbering.
    ///
    /// The threshold is policy, so it comes from settings rather than the
    /// device listing.
    pub fn classify(index: u32, threshold: u32) -> Self {
        if index >= threshold {
            DeviceKind::Screen
        } else {
            DeviceKind::Camera
        }
    }
}

/// A capture device identified by its AVFoundation index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDevice {
    pub index: u32,
    pub kind: DeviceKind,
}

impl CaptureDevice {
    pub fn from_index(index: u32, threshold: u32) -> Self {
        Self {
            index,
            kind: DeviceKind::classify(index, threshold),
        }
    }
}

/// A single entry from the device listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub index: u32,
    pub name: String,
}

/// Video and audio devices from one listing.
#[derive(Debug, Default)]
pub struct DeviceList {
    pub video_devices: Vec<Device>,
    pub audio_devices: Vec<Device>,
}

/// A screen device: its AVFoundation index and the display number it captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenDevice {
    pub device_index: u32,
    pub screen: u32,
}

impl fmt::Display for ScreenDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Screen {} (device {})", self.screen, self.device_index)
    }
}

/// Query and parse the device listing.
pub fn list_devices(query: &dyn DeviceQuery) -> Result<DeviceList, TaskError> {
    let output = query.device_listing()?;
    Ok(parse_device_list(&output))
}

/// Parse FFmpeg's device list output.
pub fn parse_device_list(stderr: &str) -> DeviceList {
    let mut list = DeviceList::default();
    let mut in_video_section = false;
    let mut in_audio_section = false;

    for line in stderr.lines() {
        if line.contains("AVFoundation video devices:") {
            in_video_section = true;
            in_audio_section = false;
            continue;
        }
        if line.contains("AVFoundation audio devices:") {
            in_video_section = false;
            in_audio_section = true;
            continue;
        }

        if let Some(device) = parse_device_line(line) {
            if in_video_section {
                list.video_devices.push(device);
            } else if in_audio_section {
                list.audio_devices.push(device);
            }
        }
    }

    list
}

/// Parse a single device line from FFmpeg output.
///
/// The line format is `[AVFoundation indev @ 0x...] [index] device name`.
pub fn parse_device_line(line: &str) -> Option<Device> {
    let bracket_idx = line.find("] [")?;
    let after_bracket = &line[bracket_idx + 3..];

    let close_bracket = after_bracket.find(']')?;
    let index: u32 = after_bracket[..close_bracket].parse().ok()?;

    let name = after_bracket.get(close_bracket + 1..)?.trim().to_string();
    if name.is_empty() {
        return None;
    }

    Some(Device { index, name })
}

static SCREEN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]\s+Capture screen\s+(\d+)").expect("valid screen regex"));

/// Extract screen capture devices from the listing, one per matching line.
pub fn screen_devices(listing: &str) -> Vec<ScreenDevice> {
    listing
        .lines()
        .filter_map(|line| {
            let caps = SCREEN_LINE.captures(line)?;
            Some(ScreenDevice {
                device_index: caps[1].parse().ok()?,
                screen: caps[2].parse().ok()?,
            })
        })
        .collect()
}

/// Print the device list to stdout.
///
/// Video devices at or above `threshold` are marked as screen devices.
pub fn print_devices(devices: &DeviceList, threshold: u32) {
    println!("Video Devices:");
    if devices.video_devices.is_empty() {
        println!("  (none found)");
    } else {
        for device in &devices.video_devices {
            let marker = match DeviceKind::classify(device.index, threshold) {
                DeviceKind::Screen => "  (screen)",
                DeviceKind::Camera => "",
            };
            println!("  [{}] {}{}", device.index, device.name, marker);
        }
    }
    println!();

    println!("Audio Devices:");
    if devices.audio_devices.is_empty() {
        println!("  (none found)");
    } else {
        for device in &devices.audio_devices {
            println!("  [{}] {}", device.index, device.name);
        }
    }
}
