//! Terminal thumbnail rendering for the monitor menu.
//!
//! Renderers are external programs (`imgcat`, `viu`, ...) tried in order.
//! Rendering is purely cosmetic, so every failure degrades to text.

use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::config::Settings;
use crate::task::{run_captured, TaskError};

const RENDER_BUDGET: Duration = Duration::from_secs(5);

/// What happened when rendering a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Drawn by the named renderer
    Rendered(String),
    /// Previews are disabled
    Skipped,
    /// No configured renderer is installed or working
    NoRenderer,
}

/// Draws images inline in the terminal.
#[derive(Debug, Clone)]
pub struct ThumbnailRenderer {
    renderers: Vec<String>,
    enabled: bool,
    poll_interval: Duration,
}

impl ThumbnailRenderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            renderers: settings.renderers.clone(),
            enabled: settings.preview,
            poll_interval: settings.poll_interval,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Render `image` to `out` with the first renderer that works.
    pub fn render<W: Write>(&self, image: &Path, out: &mut W) -> RenderOutcome {
        if !self.enabled {
            return RenderOutcome::Skipped;
        }

        for renderer in &self.renderers {
            let mut cmd = Command::new(renderer);
            cmd.arg(image);
            match run_captured(renderer, &mut cmd, RENDER_BUDGET, self.poll_interval) {
                Ok(output) if output.status.success() => {
                    if out.write_all(output.stdout.as_bytes()).is_ok() {
                        let _ = out.flush();
                        return RenderOutcome::Rendered(renderer.clone());
                    }
                }
                Ok(output) => {
                    log::debug!("{} failed: {}", renderer, output.stderr.trim());
                }
                Err(TaskError::NotFound { .. }) => {
                    log::debug!("{} is not installed", renderer);
                }
                Err(e) => log::debug!("{} failed: {}", renderer, e),
            }
        }

        RenderOutcome::NoRenderer
    }
}
