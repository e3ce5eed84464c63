//! Monitor selection.
//!
//! Enumerate screen devices; a single screen is picked automatically,
//! several are shown in a menu with a thumbnail, resolution and a rough
//! recording size estimate for each.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::Settings;
use crate::devices::{self, ScreenDevice};
use crate::displays;
use crate::error::RecorderError;
use crate::modes::Resolution;
use crate::platform::{SnapshotOutcome, Toolkit};
use crate::preview::{RenderOutcome, ThumbnailRenderer};

use super::{prompt_choice, SelectionMode, SelectionResult};

/// Bits per pixel per frame assumed for the size estimate.
const ESTIMATE_BITS_PER_PIXEL: f64 = 0.1;
const ESTIMATE_FPS: f64 = 30.0;

/// Informational bitrate and file size estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeEstimate {
    pub megabits_per_second: f64,
    pub megabytes_per_minute: f64,
}

impl SizeEstimate {
    /// `pixels * 30fps * constant`, not a prediction of encoder output.
    pub fn for_resolution(resolution: Resolution) -> Self {
        let bits_per_second = resolution.pixels() as f64 * ESTIMATE_FPS * ESTIMATE_BITS_PER_PIXEL;
        Self {
            megabits_per_second: bits_per_second / 1_000_000.0,
            megabytes_per_minute: bits_per_second * 60.0 / 8.0 / 1_000_000.0,
        }
    }
}

/// A screen device with the metadata shown in the menu.
#[derive(Debug, Clone)]
pub struct MonitorCandidate {
    pub device: ScreenDevice,
    pub resolution: Resolution,
    /// True if display info was unavailable and 1920x1080 is assumed
    pub resolution_assumed: bool,
    pub estimate: SizeEstimate,
    pub thumbnail: Option<PathBuf>,
}

/// Gather menu metadata for each screen. Every lookup is best effort.
pub fn gather_candidates(
    screens: &[ScreenDevice],
    toolkit: &Toolkit<'_>,
    thumbnail_dir: Option<&std::path::Path>,
) -> Vec<MonitorCandidate> {
    let resolutions = displays::display_resolutions(toolkit.displays);

    screens
        .iter()
        .enumerate()
        .map(|(position, &device)| {
            let (resolution, resolution_assumed) = displays::resolution_at(&resolutions, position);
            if resolution_assumed {
                log::warn!(
                    "No display info for screen {}, assuming {}",
                    device.screen,
                    resolution
                );
            }

            let thumbnail = thumbnail_dir.and_then(|dir| {
                let path = dir.join(format!("screen-{}.png", device.screen));
                match toolkit.screenshots.capture_display(device.screen, &path) {
                    Ok(SnapshotOutcome::Captured) => Some(path),
                    Ok(SnapshotOutcome::Cancelled) => {
                        log::warn!("No thumbnail for screen {}", device.screen);
                        None
                    }
                    Err(e) => {
                        log::warn!("Thumbnail capture for screen {} failed: {}", device.screen, e);
                        None
                    }
                }
            });

            MonitorCandidate {
                device,
                resolution,
                resolution_assumed,
                estimate: SizeEstimate::for_resolution(resolution),
                thumbnail,
            }
        })
        .collect()
}

/// Write the numbered menu, rendering thumbnails where possible.
pub fn print_menu<W: Write>(
    candidates: &[MonitorCandidate],
    renderer: &ThumbnailRenderer,
    output: &mut W,
) -> std::io::Result<()> {
    writeln!(output, "Available monitors:")?;
    for (i, candidate) in candidates.iter().enumerate() {
        writeln!(output)?;
        writeln!(
            output,
            "  {}) {}  {}{}",
            i + 1,
            candidate.device,
            candidate.resolution,
            if candidate.resolution_assumed { " (assumed)" } else { "" }
        )?;
        writeln!(
            output,
            "     ~{:.1} Mbit/s, ~{:.0} MB per minute",
            candidate.estimate.megabits_per_second, candidate.estimate.megabytes_per_minute
        )?;

        if let Some(thumbnail) = &candidate.thumbnail {
            if let RenderOutcome::NoRenderer = renderer.render(thumbnail, output) {
                writeln!(output, "     (preview unavailable: no image renderer installed)")?;
            }
        }
    }
    writeln!(output)
}

/// Run monitor selection.
pub fn select_monitor<R: BufRead, W: Write>(
    settings: &Settings,
    toolkit: &Toolkit<'_>,
    input: &mut R,
    output: &mut W,
) -> Result<SelectionResult, RecorderError> {
    let flow = SelectionMode::Monitor;
    let listing = toolkit
        .devices
        .device_listing()
        .map_err(|e| RecorderError::failed(flow.name(), e.to_string()))?;
    let screens = devices::screen_devices(&listing);

    match screens.as_slice() {
        [] => Err(RecorderError::NoScreenDevices),
        [only] => {
            log::info!("Only one monitor found, selecting {}", only);
            Ok(SelectionResult::Monitor(only.device_index))
        }
        _ => {
            let renderer = ThumbnailRenderer::new(settings);

            // Thumbnails are removed with the directory once a choice is made
            let scratch = if renderer.enabled() {
                tempfile::Builder::new()
                    .prefix("screenrec-thumbs-")
                    .tempdir()
                    .map_err(|e| log::warn!("No thumbnail directory: {}", e))
                    .ok()
            } else {
                None
            };

            let candidates = gather_candidates(&screens, toolkit, scratch.as_ref().map(|d| d.path()));
            let io_err = |e: std::io::Error| RecorderError::failed(flow.name(), e.to_string());
            print_menu(&candidates, &renderer, output).map_err(io_err)?;

            let choice = prompt_choice(input, output, candidates.len(), flow)?;
            let chosen = candidates[choice].device;
            log::info!("Selected {}", chosen);
            Ok(SelectionResult::Monitor(chosen.device_index))
        }
    }
}
