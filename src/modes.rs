//! Video mode catalog.
//!
//! A device's catalog is the list of (resolution, frame rate) pairs it can
//! capture. Screen devices get a fixed reference table because AVFoundation
//! cannot enumerate modes for virtual screen devices; other devices are
//! queried through FFmpeg and the diagnostic output is parsed.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::devices::{CaptureDevice, DeviceKind};
use crate::platform::DeviceQuery;

/// Frame rates offered for every screen reference resolution, in catalog order.
const SCREEN_FRAME_RATES: [u32; 4] = [30, 60, 25, 15];

/// Pixel dimensions of a video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 1920x1080, used whenever nothing better is known.
    pub const FULL_HD: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };

    pub const HD: Resolution = Resolution {
        width: 1280,
        height: 720,
    };

    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Resolution { width, height })
    }

    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s.trim().split_once('x').ok_or_else(|| {
            format!(
                "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 1920x1080)",
                s
            )
        })?;
        let width: u32 = w
            .parse()
            .map_err(|_| format!("Invalid width '{}' in resolution", w))?;
        let height: u32 = h
            .parse()
            .map_err(|_| format!("Invalid height '{}' in resolution", h))?;
        Resolution::new(width, height)
            .ok_or_else(|| "Resolution width and height must be greater than 0".to_string())
    }
}

/// A frame rate stored in thousandths of a frame per second.
///
/// Keeping the value as an integer makes exact matching well defined:
/// `30`, `30.0` and `30.000030` all resolve to the same rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRate(u32);

impl FrameRate {
    pub const THIRTY: FrameRate = FrameRate(30_000);

    pub fn from_fps(fps: u32) -> Option<Self> {
        fps.checked_mul(1000)
            .filter(|&m| m > 0)
            .map(FrameRate)
    }

    pub fn from_millis(millis: u32) -> Option<Self> {
        (millis > 0).then_some(FrameRate(millis))
    }

    pub fn millis(&self) -> u32 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.0) / 1000.0
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 1000;
        let frac = self.0 % 1000;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:03}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

impl FromStr for FrameRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fps: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a valid framerate", s))?;
        if !fps.is_finite() || fps <= 0.0 || fps > 1000.0 {
            return Err(format!("Framerate must be between 0 and 1000 fps, got {}", s));
        }
        FrameRate::from_millis((fps * 1000.0).round() as u32)
            .ok_or_else(|| format!("Framerate '{}' is too small", s))
    }
}

/// One capturable (resolution, frame rate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoMode {
    pub resolution: Resolution,
    pub frame_rate: FrameRate,
}

impl VideoMode {
    pub fn new(resolution: Resolution, frame_rate: FrameRate) -> Self {
        Self {
            resolution,
            frame_rate,
        }
    }

    /// The mode used when a device reports nothing usable: 1920x1080 @ 30.
    pub fn synthetic() -> Self {
        Self::new(Resolution::FULL_HD, FrameRate::THIRTY)
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.resolution, self.frame_rate)
    }
}

/// Where a catalog's modes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// Fixed table for screen devices
    ReferenceTable,
    /// Parsed from the device-capability query
    DeviceQuery,
    /// The query yielded nothing; a single synthetic mode stands in
    SyntheticFallback,
}

/// The modes a device supports. Never empty.
#[derive(Debug, Clone)]
pub struct ModeCatalog {
    modes: Vec<VideoMode>,
    source: CatalogSource,
}

impl ModeCatalog {
    /// Build a catalog, substituting the synthetic mode if `modes` is empty.
    pub fn new(modes: Vec<VideoMode>, source: CatalogSource) -> Self {
        if modes.is_empty() {
            return Self::synthetic();
        }
        Self { modes, source }
    }

    pub fn synthetic() -> Self {
        Self {
            modes: vec![VideoMode::synthetic()],
            source: CatalogSource::SyntheticFallback,
        }
    }

    pub fn modes(&self) -> &[VideoMode] {
        &self.modes
    }

    pub fn source(&self) -> CatalogSource {
        self.source
    }

    /// True if the synthetic mode replaced a failed query.
    pub fn is_fallback(&self) -> bool {
        self.source == CatalogSource::SyntheticFallback
    }

    pub fn contains_resolution(&self, resolution: Resolution) -> bool {
        self.modes.iter().any(|m| m.resolution == resolution)
    }

    /// Frame rates offered at `resolution`, in catalog order.
    pub fn frame_rates_for(&self, resolution: Resolution) -> Vec<FrameRate> {
        self.modes
            .iter()
            .filter(|m| m.resolution == resolution)
            .map(|m| m.frame_rate)
            .collect()
    }

    /// Largest resolution by width, ties broken by height.
    pub fn largest_resolution(&self) -> Resolution {
        self.modes
            .iter()
            .map(|m| m.resolution)
            .max()
            .unwrap_or(Resolution::FULL_HD)
    }
}

/// Fixed reference table for screen devices.
///
/// `native` is the display's own size when known; it is listed first and
/// skipped if it duplicates one of the standard sizes.
pub fn screen_reference_table(native: Option<Resolution>) -> ModeCatalog {
    let mut resolutions = Vec::with_capacity(3);
    if let Some(native) = native {
        resolutions.push(native);
    }
    for standard in [Resolution::FULL_HD, Resolution::HD] {
        if !resolutions.contains(&standard) {
            resolutions.push(standard);
        }
    }

    let modes = resolutions
        .into_iter()
        .flat_map(|resolution| {
            SCREEN_FRAME_RATES
                .iter()
                .filter_map(|&fps| FrameRate::from_fps(fps))
                .map(move |rate| VideoMode::new(resolution, rate))
        })
        .collect();

    ModeCatalog::new(modes, CatalogSource::ReferenceTable)
}

static MODE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)x(\d+)\s+(\d+(?:\.\d+)?)\s*fps").expect("valid mode regex")
});

// AVFoundation prints ranges: 1280x720@[1.000000 30.000030]fps
static MODE_RANGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)x(\d+)@\[(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\]\s*fps").expect("valid range regex")
});

/// Parse a single mode line from FFmpeg's capability output.
pub fn parse_mode_line(line: &str) -> Option<VideoMode> {
    let (w, h, fps) = if let Some(caps) = MODE_RANGE_LINE.captures(line) {
        (caps[1].to_string(), caps[2].to_string(), caps[4].to_string())
    } else {
        let caps = MODE_LINE.captures(line)?;
        (caps[1].to_string(), caps[2].to_string(), caps[3].to_string())
    };

    let resolution = Resolution::new(w.parse().ok()?, h.parse().ok()?)?;
    let frame_rate = fps.parse::<FrameRate>().ok()?;
    Some(VideoMode::new(resolution, frame_rate))
}

/// Parse every mode line in `output`, dropping duplicates but keeping order.
pub fn parse_mode_lines(output: &str) -> Vec<VideoMode> {
    let mut modes = Vec::new();
    for mode in output.lines().filter_map(parse_mode_line) {
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    modes
}

/// List the modes `device` supports.
///
/// Screen devices never touch the query. For other devices a failed or
/// empty query yields the synthetic catalog; check
/// [`ModeCatalog::is_fallback`] to detect it. The user-facing warning is
/// left to [`crate::negotiate::resolve`].
pub fn list_modes(
    device: &CaptureDevice,
    native: Option<Resolution>,
    query: &dyn DeviceQuery,
) -> ModeCatalog {
    if device.kind == DeviceKind::Screen {
        log::debug!("Device {} is a screen device, using reference table", device.index);
        return screen_reference_table(native);
    }

    let modes = match query.mode_listing(device.index) {
        Ok(output) => parse_mode_lines(&output),
        Err(e) => {
            log::debug!("Could not query modes for device {}: {}", device.index, e);
            Vec::new()
        }
    };

    if modes.is_empty() {
        log::debug!(
            "No supported modes reported for device {}, falling back to {}",
            device.index,
            VideoMode::synthetic()
        );
        return ModeCatalog::synthetic();
    }

    ModeCatalog::new(modes, CatalogSource::DeviceQuery)
}
