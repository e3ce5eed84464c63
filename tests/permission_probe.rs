//! Bounded permission probing with real child processes.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use screenrec::config::{Config, Overrides, Settings};
use screenrec::permissions::{
    PermissionCheck, PermissionProber, PermissionStatus, DEFAULT_PROBE_BUDGET,
};

fn hung_trial(_artifact: &Path) -> Command {
    let mut cmd = Command::new("sleep");
    cmd.arg("10");
    cmd
}

fn pid_file() -> PathBuf {
    std::env::temp_dir().join(format!("screenrec-hung-probe-{}.pid", std::process::id()))
}

/// Records its pid, then hangs like an unauthorized capture does.
fn recording_hung_trial(_artifact: &Path) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "echo $$ > \"$1\"; exec sleep 10", "sh"])
        .arg(pid_file());
    cmd
}

fn refusing_trial(_artifact: &Path) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "exit 1"]);
    cmd
}

#[test]
fn test_hung_trial_denied_within_budget() {
    let prober = PermissionProber::default().with_trial(recording_hung_trial);
    assert_eq!(prober.budget(), DEFAULT_PROBE_BUDGET);

    let start = Instant::now();
    assert_eq!(prober.probe(), PermissionStatus::Denied);
    let elapsed = start.elapsed();

    assert!(elapsed >= DEFAULT_PROBE_BUDGET);
    assert!(elapsed < Duration::from_secs(4), "probe took {:?}", elapsed);

    // The trial was killed and reaped, so its pid no longer exists
    let pid: i32 = std::fs::read_to_string(pid_file())
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    let _ = std::fs::remove_file(pid_file());
    assert_ne!(unsafe { libc::kill(pid, 0) }, 0);
}

#[test]
fn test_exit_without_artifact_denied() {
    let prober = PermissionProber::default().with_trial(refusing_trial);
    assert_eq!(prober.probe(), PermissionStatus::Denied);
}

#[test]
fn test_configured_budget_applies() {
    let cfg: Config = toml::from_str("[probe]\ntimeout_ms = 300\npoll_interval_ms = 20\n").unwrap();
    let settings = Settings::merge(Overrides::default(), &cfg).unwrap();
    let prober = PermissionProber::new(&settings).with_trial(hung_trial);
    assert_eq!(prober.budget(), Duration::from_millis(300));

    let start = Instant::now();
    assert_eq!(prober.probe(), PermissionStatus::Denied);
    assert!(start.elapsed() < Duration::from_secs(2));
}
