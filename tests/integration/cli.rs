#[path = "common/mod.rs"]
mod common;

use assert_cmd::Command;
use common::{unique_command, write_config};
use tempfile::tempdir;

fn steward() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("steward"))
}

#[test]
fn help_lists_all_subcommands() {
    let output = steward()
        .arg("--help")
        .output()
        .expect("failed to execute help");
    assert!(output.status.success());

    let help = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["start", "stop", "status", "reset"] {
        assert!(help.contains(subcommand), "help should mention '{subcommand}'");
    }
}

#[test]
fn missing_config_file_fails() {
    steward()
        .arg("status")
        .arg("--config")
        .arg("/nonexistent/steward.yaml")
        .assert()
        .failure();
}

#[test]
fn invalid_log_level_is_rejected() {
    steward()
        .arg("--log-level")
        .arg("verbose")
        .arg("status")
        .assert()
        .failure();
}

#[test]
fn malformed_config_fails_cleanly() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let config = dir.join("steward.yaml");
    std::fs::write(&config, "service: [not, a, mapping]").expect("write config");

    steward()
        .arg("status")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .failure();
}

#[test]
fn config_env_expansion_reaches_the_command() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let command = unique_command(dir);
    let config = write_config(dir, "${STEWARD_TEST_COMMAND}");

    // Expansion happens at load time; status scans for the expanded
    // signature and, with nothing running, reports stopped.
    let output = steward()
        .env("STEWARD_TEST_COMMAND", &command)
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
}
