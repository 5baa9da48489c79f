#[path = "common/mod.rs"]
mod common;

use assert_cmd::Command;
use common::{ServiceGuard, unique_command, wait_for_no_match, write_config};
use tempfile::tempdir;

fn steward() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("steward"))
}

#[test]
fn status_when_never_started_reports_stopped() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let config = write_config(dir, &unique_command(dir));

    let output = steward()
        .arg("status")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .arg("--json")
        .output()
        .expect("failed to execute status");

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status emits JSON");
    assert_eq!(report["running"], false);
    assert!(report.get("pid").is_none());
    assert_eq!(report["recent_log"].as_array().unwrap().len(), 0);
}

#[test]
fn status_tails_the_requested_number_of_lines() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let config = write_config(dir, &unique_command(dir));

    let log: String = (1..=30).map(|i| format!("log entry {i}\n")).collect();
    std::fs::write(dir.join("service.log"), log).expect("write log");

    let output = steward()
        .arg("status")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .arg("--json")
        .arg("--lines")
        .arg("3")
        .output()
        .expect("failed to execute status");

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status emits JSON");
    let tail = report["recent_log"].as_array().unwrap();
    assert_eq!(tail.len(), 3);
    assert_eq!(tail[0], "log entry 28");
    assert_eq!(tail[2], "log entry 30");
}

#[test]
fn status_reports_resource_usage_for_running_service() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let command = unique_command(dir);
    let _guard = ServiceGuard::new(&command);
    let config = write_config(dir, &command);

    steward()
        .arg("start")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .success();

    let output = steward()
        .arg("status")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .arg("--json")
        .output()
        .expect("failed to execute status");

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status emits JSON");
    assert_eq!(report["running"], true);
    assert!(report["pid"].as_u64().is_some());
    assert!(report["cpu_percent"].as_f64().is_some());
    assert!(report["mem_percent"].as_f64().is_some());

    steward()
        .arg("stop")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .success();
    wait_for_no_match(&command);
}

#[test]
fn status_ignores_stale_pid_record() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let config = write_config(dir, &unique_command(dir));

    // Record points at a PID that no longer exists; the scan is
    // authoritative, so the report must say stopped.
    std::fs::write(dir.join("steward.pid"), "999999\n").expect("write stale pid");

    let output = steward()
        .arg("status")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .arg("--json")
        .output()
        .expect("failed to execute status");

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status emits JSON");
    assert_eq!(report["running"], false);

    // Status is read-only: the stale record survives untouched.
    assert!(dir.join("steward.pid").exists());
}

#[test]
fn human_status_render_mentions_state() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let config = write_config(dir, &unique_command(dir));

    steward()
        .arg("status")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicates::str::contains("stopped"));
}
