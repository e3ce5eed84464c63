//! Supervision of external processes that may hang.
//!
//! Every external tool screenrec invokes runs as a [`SupervisedTask`]: its
//! output is drained on reader threads, the main flow polls it at a fixed
//! interval, and it is killed and reaped once its time budget expires. A task
//! that is dropped while still running is killed as well.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Errors from spawning or supervising an external process.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The executable does not exist on PATH
    #[error("'{program}' not found on PATH")]
    NotFound { program: String },

    /// The process could not be started
    #[error("Failed to start {label}: {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived its budget and was killed
    #[error("{label} did not finish within {budget:?} and was terminated")]
    TimedOut { label: String, budget: Duration },

    /// Polling or reaping the process failed
    #[error("I/O error while supervising {label}: {source}")]
    Io {
        label: String,
        #[source]
        source: std::io::Error,
    },
}

/// How a supervised wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The process exited on its own
    Completed(ExitStatus),
    /// The caller's readiness check succeeded while the process was running
    Ready,
    /// The budget expired; the process has been killed and reaped
    TimedOut,
}

/// Collected result of [`run_captured`].
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// A running child process under supervision.
pub struct SupervisedTask {
    label: String,
    child: Child,
    stdout_thread: Option<JoinHandle<String>>,
    stderr_thread: Option<JoinHandle<String>>,
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

impl SupervisedTask {
    /// Spawn `cmd` with stdin closed and stdout/stderr captured.
    ///
    /// `label` names the task in errors and logs.
    pub fn spawn(label: &str, cmd: &mut Command) -> Result<Self, TaskError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TaskError::NotFound {
                    program: cmd.get_program().to_string_lossy().into_owned(),
                }
            } else {
                TaskError::Spawn {
                    label: label.to_string(),
                    source: e,
                }
            }
        })?;

        log::debug!("Spawned {} (pid {})", label, child.id());

        let stdout_thread = child.stdout.take().map(drain);
        let stderr_thread = child.stderr.take().map(drain);

        Ok(SupervisedTask {
            label: label.to_string(),
            child,
            stdout_thread,
            stderr_thread,
        })
    }

    /// Poll until the process exits, `ready` returns true, or `budget` runs out.
    ///
    /// `ready` is checked before each exit poll. On timeout the process is
    /// killed and reaped before this returns.
    pub fn wait_until<F>(
        &mut self,
        budget: Duration,
        poll_interval: Duration,
        mut ready: F,
    ) -> Result<TaskOutcome, TaskError>
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();

        loop {
            if ready() {
                return Ok(TaskOutcome::Ready);
            }

            match self.child.try_wait() {
                Ok(Some(status)) => return Ok(TaskOutcome::Completed(status)),
                Ok(None) => {}
                Err(e) => {
                    return Err(TaskError::Io {
                        label: self.label.clone(),
                        source: e,
                    })
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= budget {
                log::debug!("{} exceeded {:?}, terminating", self.label, budget);
                self.terminate()?;
                return Ok(TaskOutcome::TimedOut);
            }

            thread::sleep(poll_interval.min(budget - elapsed));
        }
    }

    /// Kill the process (if still running) and reap it.
    pub fn terminate(&mut self) -> Result<(), TaskError> {
        if matches!(self.child.try_wait(), Ok(Some(_))) {
            return Ok(());
        }
        // kill() fails only if the process already exited
        let _ = self.child.kill();
        self.child.wait().map_err(|e| TaskError::Io {
            label: self.label.clone(),
            source: e,
        })?;
        Ok(())
    }

    /// Check if the process is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Process ID of the child.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Collect captured stdout and stderr. Only call after the process ended.
    fn take_output(&mut self) -> (String, String) {
        let stdout = self
            .stdout_thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let stderr = self
            .stderr_thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        (stdout, stderr)
    }
}

impl Drop for SupervisedTask {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.terminate();
        }
    }
}

/// Run `cmd` to completion within `budget`, capturing its output.
///
/// A process still running at the deadline is killed and reported as
/// [`TaskError::TimedOut`]. A non-zero exit is not an error here; callers
/// inspect `status` since several tools report useful data while failing.
pub fn run_captured(
    label: &str,
    cmd: &mut Command,
    budget: Duration,
    poll_interval: Duration,
) -> Result<TaskOutput, TaskError> {
    let mut task = SupervisedTask::spawn(label, cmd)?;

    match task.wait_until(budget, poll_interval, || false)? {
        TaskOutcome::Completed(status) => {
            let (stdout, stderr) = task.take_output();
            Ok(TaskOutput {
                status,
                stdout,
                stderr,
            })
        }
        TaskOutcome::Ready | TaskOutcome::TimedOut => Err(TaskError::TimedOut {
            label: label.to_string(),
            budget,
        }),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(20);

    #[test]
    fn test_run_captured_collects_output() {
        let output = run_captured(
            "echo",
            Command::new("sh").args(["-c", "echo out; echo err 1>&2"]),
            Duration::from_secs(5),
            POLL,
        )
        .unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn test_run_captured_reports_nonzero_exit() {
        let output = run_captured(
            "false",
            Command::new("sh").args(["-c", "exit 3"]),
            Duration::from_secs(5),
            POLL,
        )
        .unwrap();
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn test_run_captured_times_out_and_kills() {
        let start = Instant::now();
        let err = run_captured(
            "sleeper",
            Command::new("sleep").arg("10"),
            Duration::from_millis(300),
            POLL,
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let err = SupervisedTask::spawn(
            "missing",
            &mut Command::new("screenrec-definitely-not-a-real-binary"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, TaskError::NotFound { .. }));
    }

    #[test]
    fn test_wait_until_ready_leaves_process_running() {
        let mut task = SupervisedTask::spawn("sleeper", Command::new("sleep").arg("10")).unwrap();
        let outcome = task
            .wait_until(Duration::from_secs(5), POLL, || true)
            .unwrap();
        assert_eq!(outcome, TaskOutcome::Ready);
        assert!(task.is_running());
        task.terminate().unwrap();
        assert!(!task.is_running());
    }

    #[test]
    fn test_drop_kills_running_process() {
        let pid = {
            let task = SupervisedTask::spawn("sleeper", Command::new("sleep").arg("10")).unwrap();
            task.pid()
        };
        // Reaped process no longer accepts signals
        let alive = unsafe { libc::kill(pid as i32, 0) } == 0;
        assert!(!alive, "process {} should have been killed on drop", pid);
    }
}
