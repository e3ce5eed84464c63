//! Error types for screenrec.
//!
//! Recoverable conditions (unavailable modes, empty catalogs, missing display
//! info) never reach this module: they are handled by fallbacks and reported
//! as warnings. Everything here is fatal for the current invocation.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::task::TaskError;

/// Errors that abort a recording invocation.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// A required external tool is not installed
    #[error("{tool} not found. Please install it with:\n\n    {hint}\n\nSet SCREENREC_SKIP_DEPS=1 to bypass this check.")]
    MissingDependency { tool: String, hint: String },

    /// Screen recording authorization is missing
    #[error(
        "Screen Recording permission is required for {action}.\n\n\
        Please grant permission in:\n  System Settings > Privacy & Security > Screen Recording\n\n\
        You can open System Settings directly by running:\n  \
        open \"x-apple.systempreferences:com.apple.preference.security?Privacy_ScreenCapture\""
    )]
    PermissionDenied { action: String },

    /// No screen capture devices in the device listing
    #[error("No screen capture devices found.\n\nUse `screenrec list-devices` to inspect what FFmpeg reports.")]
    NoScreenDevices,

    /// The user aborted an interactive selection
    #[error("{flow} selection was cancelled. Run the command again to retry.")]
    SelectionCancelled { flow: String },

    /// An interactive selection produced no usable result
    #[error("{flow} selection failed: {reason}")]
    SelectionFailed { flow: String, reason: String },

    /// Supervising an external process failed
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The encoder exited unsuccessfully
    #[error("FFmpeg exited with code {}", .exit_code.map(|c| c.to_string()).unwrap_or_else(|| "unknown (terminated by signal)".to_string()))]
    Encoder { exit_code: Option<i32> },

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem error on a path we own
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecorderError {
    /// Exit code the process should terminate with for this error.
    ///
    /// Encoder failures propagate the encoder's own status.
    pub fn exit_code(&self) -> i32 {
        match self {
            RecorderError::Encoder {
                exit_code: Some(code),
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    pub(crate) fn cancelled(flow: &str) -> Self {
        RecorderError::SelectionCancelled {
            flow: flow.to_string(),
        }
    }

    pub(crate) fn failed(flow: &str, reason: impl Into<String>) -> Self {
        RecorderError::SelectionFailed {
            flow: flow.to_string(),
            reason: reason.into(),
        }
    }
}
