//! End-to-end checks of the `prior` binary that never reach a live server.
//!
//! Every test runs with its own HOME so the real `~/.prior/config.json` is
//! never read or written, and points the base URL at a closed local port.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DEAD_URL: &str = "http://127.0.0.1:9";

fn prior(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("prior").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("PRIOR_API_KEY")
        .env_remove("PRIOR_AGENT_ID")
        .env("PRIOR_BASE_URL", DEAD_URL)
        .env_remove("RUST_LOG")
        .write_stdin("");
    cmd
}

fn config_file(home: &TempDir) -> std::path::PathBuf {
    home.path().join(".prior").join("config.json")
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("contribute"))
        .stdout(predicate::str::contains("feedback"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn no_arguments_prints_help() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
    assert!(!config_file(&home).exists());
}

#[test]
fn unknown_outcome_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    prior(&home).args(["feedback", "k_1", "bad"]).assert().code(2);
}

#[test]
fn search_requires_a_query() {
    let home = TempDir::new().unwrap();
    prior(&home).arg("search").assert().code(2);
}

#[test]
fn contribute_without_title_fails_before_registering() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .arg("contribute")
        .write_stdin(r#"{"content": "C", "tags": ["a"]}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("title"));
    assert!(!config_file(&home).exists());
}

#[test]
fn not_useful_requires_reason() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .args(["feedback", "k_1", "not_useful"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reason"));
    assert!(!config_file(&home).exists());
}

#[test]
fn blank_verify_code_fails_before_registering() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .args(["verify", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("verification code"));
    assert!(!config_file(&home).exists());
}

#[test]
fn config_json_masks_env_key() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .env("PRIOR_API_KEY", "ask_supersecretvalue")
        .args(["--json", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("supersecretvalue").not())
        .stdout(predicate::str::contains("\"apiKey\": \"ask_…\""))
        .stdout(predicate::str::contains("\"apiKey\": \"env\""))
        .stdout(predicate::str::contains("\"exists\": false"));
    assert!(!config_file(&home).exists());
}

#[test]
fn config_path_points_into_home() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".prior"))
        .stdout(predicate::str::contains("config.json"));
}

#[test]
fn config_reset_removes_file() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .args(["config", "--reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No config file"));

    let path = config_file(&home);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{"apiKey": "ask_x", "agentId": "ag_1"}"#).unwrap();

    prior(&home)
        .args(["--json", "config", "--reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\": true"));
    assert!(!path.exists());
}

#[test]
fn corrupt_config_is_reported() {
    let home = TempDir::new().unwrap();
    let path = config_file(&home);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{not json").unwrap();

    prior(&home)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn half_credentials_in_env_are_rejected() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .env("PRIOR_API_KEY", "ask_user_env")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PRIOR_AGENT_ID"));
    assert!(!config_file(&home).exists());
}

#[test]
fn unreachable_server_fails_cleanly() {
    let home = TempDir::new().unwrap();
    prior(&home)
        .env("PRIOR_API_KEY", "ask_test")
        .env("PRIOR_AGENT_ID", "ag_test")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
    assert!(!config_file(&home).exists());
}
