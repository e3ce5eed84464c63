//! Screen Recording permission probe.
//!
//! On macOS a capture call made without Screen Recording authorization does
//! not fail: it hangs. The probe therefore runs a trial capture as a
//! supervised child process, polls for the screenshot it should produce, and
//! kills it once the time budget runs out. Only an image written before the
//! deadline counts as `Granted`.

use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::task::{SupervisedTask, TaskOutcome};

/// Default wall-clock budget for the trial capture.
pub const DEFAULT_PROBE_BUDGET: Duration = Duration::from_secs(2);

/// Default interval between completion polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a permission probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        *self == PermissionStatus::Granted
    }
}

/// Anything that can answer "may this process capture the screen?".
pub trait PermissionCheck {
    fn probe(&self) -> PermissionStatus;
}

/// Builds the trial capture command writing to the given path.
pub type TrialCommand = fn(&Path) -> Command;

fn screencapture_trial(artifact: &Path) -> Command {
    let mut cmd = Command::new("screencapture");
    cmd.args(["-x", "-t", "png"]).arg(artifact);
    cmd
}

/// Probes authorization with a bounded trial capture.
#[derive(Debug, Clone)]
pub struct PermissionProber {
    budget: Duration,
    poll_interval: Duration,
    trial: TrialCommand,
}

impl Default for PermissionProber {
    fn default() -> Self {
        Self {
            budget: DEFAULT_PROBE_BUDGET,
            poll_interval: DEFAULT_POLL_INTERVAL,
            trial: screencapture_trial,
        }
    }
}

impl PermissionProber {
    pub fn new(settings: &Settings) -> Self {
        Self {
            budget: settings.probe_timeout,
            poll_interval: settings.poll_interval,
            ..Default::default()
        }
    }

    /// Replace the trial capture command.
    pub fn with_trial(mut self, trial: TrialCommand) -> Self {
        self.trial = trial;
        self
    }

    pub fn with_budget(mut self, budget: Duration, poll_interval: Duration) -> Self {
        self.budget = budget;
        self.poll_interval = poll_interval;
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    fn run_trial(&self) -> Result<PermissionStatus, String> {
        // Dropping the directory removes the artifact on every path
        let scratch = tempfile::Builder::new()
            .prefix("screenrec-probe-")
            .tempdir()
            .map_err(|e| format!("could not create probe directory: {}", e))?;
        let artifact = scratch.path().join("probe.png");

        let mut task = SupervisedTask::spawn("screen capture probe", &mut (self.trial)(&artifact))
            .map_err(|e| e.to_string())?;

        let outcome = task
            .wait_until(self.budget, self.poll_interval, || artifact_written(&artifact))
            .map_err(|e| e.to_string())?;

        let status = match outcome {
            TaskOutcome::Ready => {
                task.terminate().map_err(|e| e.to_string())?;
                PermissionStatus::Granted
            }
            TaskOutcome::Completed(_) if artifact_written(&artifact) => PermissionStatus::Granted,
            TaskOutcome::Completed(status) => {
                log::debug!("Probe exited with {:?} without an image", status.code());
                PermissionStatus::Denied
            }
            TaskOutcome::TimedOut => {
                log::debug!("Probe still running after {:?}, terminated", self.budget);
                PermissionStatus::Denied
            }
        };
        Ok(status)
    }
}

impl PermissionCheck for PermissionProber {
    fn probe(&self) -> PermissionStatus {
        let start = Instant::now();
        let status = self.run_trial().unwrap_or_else(|reason| {
            log::warn!("Screen Recording probe failed: {}", reason);
            PermissionStatus::Denied
        });
        log::debug!("Screen Recording probe: {:?} in {:?}", status, start.elapsed());
        status
    }
}

fn artifact_written(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Print the probe result with remediation steps when denied.
pub fn print_permission_report(status: PermissionStatus) {
    match status {
        PermissionStatus::Granted => println!("[OK] Screen Recording permission granted"),
        PermissionStatus::Denied => {
            println!("[MISSING] Screen Recording permission");
            println!("   Grant permission in: System Settings > Privacy & Security > Screen Recording");
            println!(
                "   Or run: open \"x-apple.systempreferences:com.apple.preference.security?Privacy_ScreenCapture\""
            );
            println!("   After granting permission, you may need to restart your terminal.");
        }
    }
}
