//! Startup check for required external tools.

use std::process::Command;
use std::time::Duration;

use crate::error::RecorderError;
use crate::task::{run_captured, TaskError};

const CHECK_BUDGET: Duration = Duration::from_secs(10);
const CHECK_POLL: Duration = Duration::from_millis(50);

/// An external program screenrec needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    pub program: &'static str,
    /// Harmless arguments that make the program exit promptly
    pub probe_args: &'static [&'static str],
    pub install_hint: &'static str,
}

pub const REQUIRED: [Dependency; 2] = [
    Dependency {
        name: "FFmpeg",
        program: "ffmpeg",
        probe_args: &["-hide_banner", "-version"],
        install_hint: "brew install ffmpeg",
    },
    Dependency {
        name: "screencapture",
        program: "screencapture",
        probe_args: &["-h"],
        install_hint: "screencapture ships with macOS; run screenrec on macOS",
    },
];

/// True if the program can be started. Its exit status is irrelevant.
pub fn is_available(dep: &Dependency) -> bool {
    match run_captured(
        dep.name,
        Command::new(dep.program).args(dep.probe_args),
        CHECK_BUDGET,
        CHECK_POLL,
    ) {
        Ok(_) => true,
        Err(TaskError::NotFound { .. }) => false,
        Err(e) => {
            log::debug!("{} check inconclusive: {}", dep.name, e);
            true
        }
    }
}

/// Fail on the first missing dependency.
pub fn check_dependencies(deps: &[Dependency]) -> Result<(), RecorderError> {
    for dep in deps {
        if !is_available(dep) {
            return Err(RecorderError::MissingDependency {
                tool: dep.name.to_string(),
                hint: dep.install_hint.to_string(),
            });
        }
        log::debug!("{} found", dep.name);
    }
    Ok(())
}

/// Print one line per dependency.
pub fn print_dependency_report(deps: &[Dependency]) -> bool {
    let mut all_ok = true;
    for dep in deps {
        if is_available(dep) {
            println!("[OK] {}", dep.name);
        } else {
            all_ok = false;
            println!("[MISSING] {} (install: {})", dep.name, dep.install_hint);
        }
    }
    all_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: Dependency = Dependency {
        name: "Nothing",
        program: "screenrec-no-such-tool",
        probe_args: &[],
        install_hint: "nowhere",
    };

    #[test]
    fn test_missing_dependency_is_fatal() {
        let err = check_dependencies(&[MISSING]).unwrap_err();
        match err {
            RecorderError::MissingDependency { tool, hint } => {
                assert_eq!(tool, "Nothing");
                assert_eq!(hint, "nowhere");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_present_dependency_passes_even_on_nonzero_exit() {
        let dep = Dependency {
            name: "sh",
            program: "sh",
            probe_args: &["-c", "exit 1"],
            install_hint: "",
        };
        assert!(check_dependencies(&[dep]).is_ok());
    }
}
