//! Interactive capture target selection.
//!
//! Three mutually exclusive flows narrow what gets recorded:
//! - [`monitor`]: pick one screen device from a menu
//! - [`area`]: drag a rectangle with the system screenshot tool
//! - [`window`]: click a window with the system screenshot tool
//!
//! Each flow returns a [`SelectionResult`] or fails without leaving
//! temporary files behind.

pub mod area;
pub mod monitor;
pub mod window;

use std::fmt;
use std::io::{BufRead, Write};

use crate::config::Settings;
use crate::error::RecorderError;
use crate::platform::{InteractiveMode, SnapshotOutcome, Toolkit};

/// A crop rectangle in capture pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl Region {
    /// FFmpeg crop filter: `crop=width:height:x:y`.
    pub fn crop_filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.x, self.y)
    }
}

/// Which selection flow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Monitor,
    Area,
    Window,
}

impl SelectionMode {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionMode::Monitor => "Monitor",
            SelectionMode::Area => "Area",
            SelectionMode::Window => "Window",
        }
    }
}

/// The resolved capture target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionResult {
    /// Record this screen device in full
    Monitor(u32),
    /// Record a cropped rectangle of the configured device
    Area(Region),
    /// Record the rectangle a window occupied at selection time
    Window(Region),
}

impl SelectionResult {
    /// Device index chosen by the selection, if it chose one.
    pub fn device(&self) -> Option<u32> {
        match self {
            SelectionResult::Monitor(index) => Some(*index),
            _ => None,
        }
    }

    pub fn region(&self) -> Option<Region> {
        match self {
            SelectionResult::Monitor(_) => None,
            SelectionResult::Area(region) | SelectionResult::Window(region) => Some(*region),
        }
    }
}

/// Run the selection flow for `mode`.
///
/// `input`/`output` carry the monitor menu dialogue.
pub fn select<R: BufRead, W: Write>(
    mode: SelectionMode,
    settings: &Settings,
    toolkit: &Toolkit<'_>,
    input: &mut R,
    output: &mut W,
) -> Result<SelectionResult, RecorderError> {
    match mode {
        SelectionMode::Monitor => monitor::select_monitor(settings, toolkit, input, output),
        SelectionMode::Area => area::select_area(toolkit, output),
        SelectionMode::Window => window::select_window(toolkit, output),
    }
}

/// Run the interactive screenshot tool and measure the image it returns.
///
/// The image lives in a private temporary directory that is removed before
/// this returns, whatever the outcome.
pub(crate) fn capture_dimensions(
    toolkit: &Toolkit<'_>,
    mode: InteractiveMode,
    flow: SelectionMode,
) -> Result<(u32, u32), RecorderError> {
    let scratch = tempfile::Builder::new()
        .prefix("screenrec-select-")
        .tempdir()
        .map_err(|e| RecorderError::failed(flow.name(), format!("no scratch directory: {}", e)))?;
    let image = scratch.path().join("selection.png");

    match toolkit.screenshots.capture_interactive(mode, &image) {
        Ok(SnapshotOutcome::Captured) => {}
        Ok(SnapshotOutcome::Cancelled) => return Err(RecorderError::cancelled(flow.name())),
        Err(e) => return Err(RecorderError::failed(flow.name(), e.to_string())),
    }

    let (width, height) = image::image_dimensions(&image).map_err(|e| {
        RecorderError::failed(flow.name(), format!("could not read selection size: {}", e))
    })?;

    if width == 0 || height == 0 {
        return Err(RecorderError::failed(flow.name(), "selection is empty"));
    }

    Ok((width, height))
}

/// Prompt until the user enters a number in `1..=count`.
///
/// Returns the zero-based choice. End of input counts as cancellation.
pub fn prompt_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    count: usize,
    flow: SelectionMode,
) -> Result<usize, RecorderError> {
    let io_err = |e: std::io::Error| RecorderError::failed(flow.name(), e.to_string());

    loop {
        write!(output, "Select {} [1-{}]: ", flow.name().to_lowercase(), count).map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            writeln!(output).map_err(io_err)?;
            return Err(RecorderError::cancelled(flow.name()));
        }

        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=count).contains(&choice) => return Ok(choice - 1),
            _ => {
                writeln!(
                    output,
                    "Invalid choice '{}'. Enter a number between 1 and {}.",
                    line.trim(),
                    count
                )
                .map_err(io_err)?;
            }
        }
    }
}
