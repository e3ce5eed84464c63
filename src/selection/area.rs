//! Area selection.
//!
//! The screenshot tool returns only the cropped image, never where the
//! rectangle was. Size comes from the image; the origin is approximated by
//! centering the rectangle on the pointer, which usually sits where the drag
//! ended or near it.

use std::io::Write;

use crate::error::RecorderError;
use crate::permissions::PermissionStatus;
use crate::platform::{InteractiveMode, Toolkit};

use super::{capture_dimensions, Region, SelectionMode, SelectionResult};

/// Approximate the top-left corner: pointer minus half the size, clamped to 0.
pub fn estimate_origin(pointer: Option<(i64, i64)>, width: u32, height: u32) -> (u32, u32) {
    let Some((px, py)) = pointer else {
        return (0, 0);
    };
    let clamp = |pointer: i64, extent: u32| -> u32 {
        let origin = pointer.saturating_sub(i64::from(extent / 2)).max(0);
        u32::try_from(origin).unwrap_or(u32::MAX)
    };
    (clamp(px, width), clamp(py, height))
}

/// Run area selection. Requires Screen Recording permission.
pub fn select_area<W: Write>(
    toolkit: &Toolkit<'_>,
    output: &mut W,
) -> Result<SelectionResult, RecorderError> {
    let flow = SelectionMode::Area;

    if toolkit.permission.probe() != PermissionStatus::Granted {
        return Err(RecorderError::PermissionDenied {
            action: "area selection".to_string(),
        });
    }

    writeln!(output, "Drag to select the area to record (Esc to cancel)...")
        .map_err(|e| RecorderError::failed(flow.name(), e.to_string()))?;
    let (width, height) = capture_dimensions(toolkit, InteractiveMode::Area, flow)?;

    let pointer = toolkit.pointer.pointer_position();
    if pointer.is_none() {
        log::warn!("Pointer position unavailable, area origin defaults to (0, 0)");
    }
    let (x, y) = estimate_origin(pointer, width, height);

    let region = Region {
        width,
        height,
        x,
        y,
    };
    log::info!("Selected area {} (position is approximate)", region);
    Ok(SelectionResult::Area(region))
}
