//! FFmpeg encoder execution.
//!
//! The encoder runs attached to the terminal so the user can stop it with
//! `q`. Ctrl+C is forwarded as SIGINT so FFmpeg can finalize the container.

use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::RecorderError;
use crate::job::CaptureJobDescriptor;
use crate::task::TaskError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Global flag for handling Ctrl+C across the application
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C has been received.
pub fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, finishing recording...");
    })
}

/// A running FFmpeg encoder.
pub struct Encoder {
    child: Child,
    interrupted: bool,
}

impl Encoder {
    /// Spawn FFmpeg for `job`.
    pub fn spawn(job: &CaptureJobDescriptor) -> Result<Self, RecorderError> {
        let child = Command::new("ffmpeg")
            .args(job.to_args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RecorderError::MissingDependency {
                        tool: "FFmpeg".to_string(),
                        hint: "brew install ffmpeg".to_string(),
                    }
                } else {
                    RecorderError::Task(TaskError::Spawn {
                        label: "FFmpeg encoder".to_string(),
                        source: e,
                    })
                }
            })?;

        log::info!("Recording to {} (press q to stop)", job.output().display());
        Ok(Encoder {
            child,
            interrupted: false,
        })
    }

    /// Send SIGINT (equivalent to Ctrl+C) once.
    fn interrupt(&mut self) {
        if self.interrupted {
            return;
        }
        self.interrupted = true;

        #[cfg(unix)]
        {
            let pid = self.child.id() as i32;
            unsafe {
                libc::kill(pid, libc::SIGINT);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = self.child.kill();
        }
    }

    /// Wait for FFmpeg to exit, forwarding Ctrl+C.
    pub fn wait(&mut self) -> Result<ExitStatus, RecorderError> {
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if ctrlc_received() {
                        self.interrupt();
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(RecorderError::Task(TaskError::Io {
                        label: "FFmpeg encoder".to_string(),
                        source: e,
                    }))
                }
            }
        }
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Run the encoder to completion. Non-zero exit is a job failure.
pub fn run(job: &CaptureJobDescriptor) -> Result<(), RecorderError> {
    let mut encoder = Encoder::spawn(job)?;
    let status = encoder.wait()?;

    if status.success() {
        log::info!("Saved {}", job.output().display());
        Ok(())
    } else {
        Err(RecorderError::Encoder {
            exit_code: status.code(),
        })
    }
}
