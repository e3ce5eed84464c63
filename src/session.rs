//! Plans a capture job from settings and an optional selection.
//!
//! Control flow: selection (optional) → mode catalog → negotiation →
//! descriptor assembly. Nothing here runs the encoder.

use std::io::{BufRead, Write};

use crate::config::Settings;
use crate::devices::{CaptureDevice, DeviceKind};
use crate::displays;
use crate::error::RecorderError;
use crate::job::{assemble, CaptureJobDescriptor};
use crate::modes::{self, ModeCatalog};
use crate::negotiate::{self, Negotiated};
use crate::platform::Toolkit;
use crate::selection::{self, SelectionMode, SelectionResult};

/// A fully resolved job plus the decisions that led to it.
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub descriptor: CaptureJobDescriptor,
    pub selection: Option<SelectionResult>,
    pub catalog: ModeCatalog,
    pub negotiation: Negotiated,
}

/// Resolve everything needed to start recording.
pub fn plan<R: BufRead, W: Write>(
    settings: &Settings,
    mode: Option<SelectionMode>,
    toolkit: &Toolkit<'_>,
    input: &mut R,
    output: &mut W,
) -> Result<PlannedJob, RecorderError> {
    let selection = mode
        .map(|m| selection::select(m, settings, toolkit, input, output))
        .transpose()?;

    let index = selection
        .and_then(|s| s.device())
        .unwrap_or(settings.device);
    let device = CaptureDevice::from_index(index, settings.screen_device_threshold);

    // Native size only matters for the screen reference table
    let native = match device.kind {
        DeviceKind::Screen => displays::display_resolutions(toolkit.displays)
            .first()
            .copied(),
        DeviceKind::Camera => None,
    };

    let catalog = modes::list_modes(&device, native, toolkit.devices);
    let negotiation = negotiate::resolve(&settings.request, &catalog);
    let descriptor = assemble(
        device.index,
        selection.and_then(|s| s.region()),
        negotiation.mode,
        &settings.encoding,
    );

    log::info!(
        "Capturing device {} at {}{}",
        device.index,
        negotiation.mode,
        descriptor
            .region()
            .map(|r| format!(", cropped to {}", r))
            .unwrap_or_default()
    );

    Ok(PlannedJob {
        descriptor,
        selection,
        catalog,
        negotiation,
    })
}
