//! Window selection.
//!
//! Window placement cannot be recovered from the returned image, so the
//! crop starts at (0, 0). The region is fixed at selection time.

use std::io::Write;

use crate::error::RecorderError;
use crate::platform::{InteractiveMode, Toolkit};

use super::{capture_dimensions, Region, SelectionMode, SelectionResult};

/// Run window selection.
pub fn select_window<W: Write>(
    toolkit: &Toolkit<'_>,
    output: &mut W,
) -> Result<SelectionResult, RecorderError> {
    let flow = SelectionMode::Window;
    writeln!(output, "Click the window to record (Esc to cancel)...")
        .map_err(|e| RecorderError::failed(flow.name(), e.to_string()))?;
    let (width, height) = capture_dimensions(toolkit, InteractiveMode::Window, flow)?;

    let region = Region {
        width,
        height,
        x: 0,
        y: 0,
    };
    log::warn!(
        "Recording a fixed {}x{} region: keep the window where it is for the whole recording",
        width,
        height
    );
    Ok(SelectionResult::Window(region))
}
