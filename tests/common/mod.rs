//! Scripted stand-ins for the external tools, shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::io;
use std::path::{Path, PathBuf};

use screenrec::config::{Config, Overrides, Settings};
use screenrec::permissions::{PermissionCheck, PermissionStatus};
use screenrec::platform::{
    DeviceQuery, DisplayQuery, InteractiveMode, PointerLocator, ScreenshotTool, SnapshotOutcome,
    Toolkit,
};
use screenrec::task::TaskError;

pub const FFMPEG_HEADER: &str = "\
[AVFoundation indev @ 0x7f8b1c704a80] AVFoundation video devices:
[AVFoundation indev @ 0x7f8b1c704a80] [0] FaceTime HD Camera";

pub const FFMPEG_AUDIO: &str = "\
[AVFoundation indev @ 0x7f8b1c704a80] AVFoundation audio devices:
[AVFoundation indev @ 0x7f8b1c704a80] [0] MacBook Pro Microphone";

/// Device listing with `screens` screen devices starting at index 4.
pub fn listing_with_screens(screens: u32) -> String {
    let mut listing = String::from(FFMPEG_HEADER);
    for screen in 0..screens {
        listing.push_str(&format!(
            "\n[AVFoundation indev @ 0x7f8b1c704a80] [{}] Capture screen {}",
            4 + screen,
            screen
        ));
    }
    listing.push('\n');
    listing.push_str(FFMPEG_AUDIO);
    listing
}

fn missing(program: &str) -> TaskError {
    TaskError::NotFound {
        program: program.to_string(),
    }
}

pub struct Fakes {
    pub listing: String,
    pub modes: Option<String>,
    pub display_report: Option<String>,
    /// Image size the interactive picker "captures", `None` means the user cancelled
    pub picked: Option<(u32, u32)>,
    pub pointer: Option<(i64, i64)>,
    pub permission: PermissionStatus,
    /// Per-display snapshots fail instead of writing an image
    pub display_capture_fails: bool,
    pub interactive_calls: Cell<u32>,
    /// Every destination path handed to the screenshot tool
    pub written_paths: RefCell<Vec<PathBuf>>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            listing: listing_with_screens(1),
            modes: None,
            display_report: None,
            picked: None,
            pointer: None,
            permission: PermissionStatus::Granted,
            display_capture_fails: false,
            interactive_calls: Cell::new(0),
            written_paths: RefCell::new(Vec::new()),
        }
    }
}

impl Fakes {
    pub fn toolkit(&self) -> Toolkit<'_> {
        Toolkit {
            devices: self,
            displays: self,
            screenshots: self,
            pointer: self,
            permission: self,
        }
    }
}

impl DeviceQuery for Fakes {
    fn device_listing(&self) -> Result<String, TaskError> {
        Ok(self.listing.clone())
    }

    fn mode_listing(&self, _index: u32) -> Result<String, TaskError> {
        self.modes.clone().ok_or_else(|| missing("ffmpeg"))
    }
}

impl DisplayQuery for Fakes {
    fn display_report(&self) -> Result<String, TaskError> {
        self.display_report
            .clone()
            .ok_or_else(|| missing("system_profiler"))
    }
}

fn write_png(dest: &Path, width: u32, height: u32) -> Result<(), TaskError> {
    image::RgbImage::new(width, height)
        .save(dest)
        .map_err(|e| TaskError::Io {
            label: "fake screenshot".to_string(),
            source: io::Error::other(e.to_string()),
        })
}

impl ScreenshotTool for Fakes {
    fn capture_interactive(
        &self,
        _mode: InteractiveMode,
        dest: &Path,
    ) -> Result<SnapshotOutcome, TaskError> {
        self.interactive_calls.set(self.interactive_calls.get() + 1);
        self.written_paths.borrow_mut().push(dest.to_path_buf());
        match self.picked {
            Some((width, height)) => {
                write_png(dest, width, height)?;
                Ok(SnapshotOutcome::Captured)
            }
            None => Ok(SnapshotOutcome::Cancelled),
        }
    }

    fn capture_display(&self, _screen: u32, dest: &Path) -> Result<SnapshotOutcome, TaskError> {
        self.written_paths.borrow_mut().push(dest.to_path_buf());
        if self.display_capture_fails {
            return Err(TaskError::TimedOut {
                label: "display screencapture".to_string(),
                budget: std::time::Duration::from_secs(10),
            });
        }
        write_png(dest, 16, 9)?;
        Ok(SnapshotOutcome::Captured)
    }
}

impl PointerLocator for Fakes {
    fn pointer_position(&self) -> Option<(i64, i64)> {
        self.pointer
    }
}

impl PermissionCheck for Fakes {
    fn probe(&self) -> PermissionStatus {
        self.permission
    }
}

/// Built-in defaults with thumbnails off.
pub fn settings() -> Settings {
    settings_with(Overrides::default())
}

pub fn settings_with(overrides: Overrides) -> Settings {
    let overrides = Overrides {
        no_preview: true,
        ..overrides
    };
    Settings::merge(overrides, &Config::default()).unwrap()
}

/// Built-in defaults with thumbnails on, drawn by `renderers`.
pub fn preview_settings(renderers: &[&str]) -> Settings {
    let mut settings = Settings::merge(Overrides::default(), &Config::default()).unwrap();
    settings.renderers = renderers.iter().map(|r| r.to_string()).collect();
    settings
}

/// Scratch directories the screenshot tool wrote into, asserting each is gone.
pub fn assert_scratch_removed(fakes: &Fakes, prefix: &str) {
    let paths = fakes.written_paths.borrow();
    assert!(!paths.is_empty(), "screenshot tool was never called");
    for path in paths.iter() {
        let dir = path.parent().unwrap();
        let name = dir.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(prefix), "unexpected scratch dir {}", dir.display());
        assert!(!dir.exists(), "{} was left behind", dir.display());
    }
}
