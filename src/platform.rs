//! Narrow interfaces over the external tools screenrec drives.
//!
//! Each trait returns either raw diagnostic text (parsed elsewhere into
//! structured data) or a plain success/cancel outcome, so parsing fragility
//! stays out of negotiation and selection logic. [`MacPlatform`] implements
//! them with FFmpeg, `system_profiler`, `screencapture` and `osascript`.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::config::Settings;
use crate::permissions::PermissionCheck;
use crate::task::{run_captured, TaskError};

/// Device listing and per-device capability queries.
pub trait DeviceQuery {
    /// Diagnostic output of the device listing.
    fn device_listing(&self) -> Result<String, TaskError>;

    /// Diagnostic output of a capability query for device `index`.
    fn mode_listing(&self, index: u32) -> Result<String, TaskError>;
}

/// System display metadata.
pub trait DisplayQuery {
    /// Report containing one `Resolution: <W> x <H>` line per display.
    fn display_report(&self) -> Result<String, TaskError>;
}

/// Which interactive picker the screenshot tool should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveMode {
    Area,
    Window,
}

/// How an interactive capture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// An image was written to the destination
    Captured,
    /// The user aborted, or the tool exited without an image
    Cancelled,
}

/// Screenshot capture, interactive or per display.
pub trait ScreenshotTool {
    fn capture_interactive(
        &self,
        mode: InteractiveMode,
        dest: &Path,
    ) -> Result<SnapshotOutcome, TaskError>;

    /// Non-interactive snapshot of `screen` (zero-based display number).
    fn capture_display(&self, screen: u32, dest: &Path) -> Result<SnapshotOutcome, TaskError>;
}

/// Current mouse pointer location in global screen coordinates.
pub trait PointerLocator {
    fn pointer_position(&self) -> Option<(i64, i64)>;
}

/// The set of collaborators a capture session needs.
pub struct Toolkit<'a> {
    pub devices: &'a dyn DeviceQuery,
    pub displays: &'a dyn DisplayQuery,
    pub screenshots: &'a dyn ScreenshotTool,
    pub pointer: &'a dyn PointerLocator,
    pub permission: &'a dyn PermissionCheck,
}

/// Query budget for tools that should answer immediately.
const QUERY_BUDGET: Duration = Duration::from_secs(10);

// Flips AppKit's bottom-left origin into top-left screen coordinates.
const POINTER_SCRIPT: &str = r#"ObjC.import("AppKit");
var p = $.NSEvent.mouseLocation;
var h = $.NSScreen.mainScreen.frame.size.height;
Math.round(p.x) + "," + Math.round(h - p.y);"#;

/// macOS implementation backed by command-line tools.
#[derive(Debug, Clone)]
pub struct MacPlatform {
    poll_interval: Duration,
    tool_timeout: Duration,
}

impl MacPlatform {
    pub fn new(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval,
            tool_timeout: settings.tool_timeout,
        }
    }

    fn snapshot(
        &self,
        label: &str,
        cmd: &mut Command,
        budget: Duration,
        dest: &Path,
    ) -> Result<SnapshotOutcome, TaskError> {
        let output = run_captured(label, cmd, budget, self.poll_interval)?;
        let written = std::fs::metadata(dest).map(|m| m.len() > 0).unwrap_or(false);

        if output.status.success() && written {
            Ok(SnapshotOutcome::Captured)
        } else {
            log::debug!(
                "{} exited with {:?} (image written: {}): {}",
                label,
                output.status.code(),
                written,
                output.stderr.trim()
            );
            Ok(SnapshotOutcome::Cancelled)
        }
    }
}

impl DeviceQuery for MacPlatform {
    fn device_listing(&self) -> Result<String, TaskError> {
        // FFmpeg prints the listing to stderr and exits non-zero
        let output = run_captured(
            "FFmpeg device listing",
            Command::new("ffmpeg").args([
                "-hide_banner",
                "-f",
                "avfoundation",
                "-list_devices",
                "true",
                "-i",
                "",
            ]),
            QUERY_BUDGET,
            self.poll_interval,
        )?;
        Ok(output.stderr)
    }

    fn mode_listing(&self, index: u32) -> Result<String, TaskError> {
        // Requesting an impossible size makes AVFoundation list the supported modes
        let output = run_captured(
            "FFmpeg mode query",
            Command::new("ffmpeg").args([
                "-hide_banner",
                "-f",
                "avfoundation",
                "-framerate",
                "1",
                "-video_size",
                "1x1",
                "-i",
                &format!("{}:none", index),
                "-frames:v",
                "1",
                "-f",
                "null",
                "-",
            ]),
            QUERY_BUDGET,
            self.poll_interval,
        )?;
        Ok(output.stderr)
    }
}

impl DisplayQuery for MacPlatform {
    fn display_report(&self) -> Result<String, TaskError> {
        let output = run_captured(
            "system_profiler",
            Command::new("system_profiler").arg("SPDisplaysDataType"),
            QUERY_BUDGET,
            self.poll_interval,
        )?;
        Ok(output.stdout)
    }
}

impl ScreenshotTool for MacPlatform {
    fn capture_interactive(
        &self,
        mode: InteractiveMode,
        dest: &Path,
    ) -> Result<SnapshotOutcome, TaskError> {
        let mut cmd = Command::new("screencapture");
        cmd.arg("-i");
        if mode == InteractiveMode::Window {
            cmd.arg("-w");
        }
        cmd.arg("-x").arg(dest);
        self.snapshot("interactive screencapture", &mut cmd, self.tool_timeout, dest)
    }

    fn capture_display(&self, screen: u32, dest: &Path) -> Result<SnapshotOutcome, TaskError> {
        // screencapture numbers displays from 1
        let mut cmd = Command::new("screencapture");
        cmd.args(["-x", "-t", "png", "-D"])
            .arg((screen + 1).to_string())
            .arg(dest);
        self.snapshot("display screencapture", &mut cmd, QUERY_BUDGET, dest)
    }
}

impl PointerLocator for MacPlatform {
    fn pointer_position(&self) -> Option<(i64, i64)> {
        let output = run_captured(
            "pointer lookup",
            Command::new("osascript").args(["-l", "JavaScript", "-e", POINTER_SCRIPT]),
            QUERY_BUDGET,
            self.poll_interval,
        )
        .map_err(|e| log::debug!("Pointer lookup failed: {}", e))
        .ok()?;

        if !output.status.success() {
            log::debug!("Pointer lookup failed: {}", output.stderr.trim());
            return None;
        }
        parse_pointer(&output.stdout)
    }
}

/// Parse `x,y` as printed by the pointer script.
pub fn parse_pointer(output: &str) -> Option<(i64, i64)> {
    let (x, y) = output.trim().split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pointer() {
        assert_eq!(parse_pointer("812,455\n"), Some((812, 455)));
        assert_eq!(parse_pointer("-20, 40"), Some((-20, 40)));
        assert_eq!(parse_pointer(""), None);
        assert_eq!(parse_pointer("812"), None);
        assert_eq!(parse_pointer("a,b"), None);
    }
}
