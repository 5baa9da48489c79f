#[path = "common/mod.rs"]
mod common;

use assert_cmd::Command;
use common::{ServiceGuard, unique_command, wait_for_match, wait_for_no_match, write_config};
use std::fs;
use tempfile::tempdir;

fn steward() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("steward"))
}

fn plant_artifacts(dir: &std::path::Path) {
    fs::write(dir.join("bot.db"), b"sqlite data").expect("write db");
    let nested = dir.join("bot/services/__pycache__");
    fs::create_dir_all(&nested).expect("create cache dir");
    fs::write(nested.join("heygen_api.cpython-311.pyc"), b"bytecode").expect("write pyc");
    fs::create_dir_all(dir.join("__pycache__")).expect("create cache dir");
}

#[test]
fn reset_when_stopped_clears_artifacts() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let config = write_config(dir, &unique_command(dir));
    plant_artifacts(dir);

    steward()
        .arg("reset")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicates::str::contains("was not running"));

    assert!(!dir.join("bot.db").exists());
    assert!(!dir.join("__pycache__").exists());
    assert!(!dir.join("bot/services/__pycache__").exists());
    // Non-cache directories survive the prune.
    assert!(dir.join("bot/services").exists());
}

#[test]
fn reset_while_running_stops_service_first() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let command = unique_command(dir);
    let _guard = ServiceGuard::new(&command);
    let config = write_config(dir, &command);
    plant_artifacts(dir);

    steward()
        .arg("start")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .success();
    wait_for_match(&command);

    steward()
        .arg("reset")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .success();

    wait_for_no_match(&command);
    assert!(!dir.join("bot.db").exists());
    assert!(!dir.join("__pycache__").exists());
    assert!(!dir.join("steward.pid").exists());
}

#[test]
fn reset_with_nothing_to_delete_is_noop_success() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let config = write_config(dir, &unique_command(dir));

    steward()
        .arg("reset")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicates::str::contains("No artifacts to remove"));
}
