//! Integration tests for `settle config`.

mod common;

use common::{TestEnv, parse_json};
use predicates::prelude::*;
use serde_json::json;

#[test]
fn test_config_list_defaults() {
    let env = TestEnv::new();

    let output = env.settle().args(["config", "list"]).output().unwrap();

    assert!(output.status.success());
    let entries = parse_json(&output.stdout)["entries"].clone();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(
        entries[0],
        json!({"key": "app-id", "value": "default", "source": "default"})
    );
    assert_eq!(entries[3]["value"], json!("10000"));
}

#[test]
fn test_config_set_then_get() {
    let env = TestEnv::new();

    env.settle()
        .args(["config", "set", "server-url", "http://settings.internal:8080/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://settings.internal:8080"));

    let kdl = std::fs::read_to_string(env.data_path().join("config.kdl")).unwrap();
    assert!(kdl.contains("server-url"));

    env.settle()
        .args(["config", "get", "server-url"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""value":"http://settings.internal:8080""#))
        .stdout(predicate::str::contains(r#""source":"config""#));
}

#[test]
fn test_env_overrides_config_file() {
    let env = TestEnv::new();
    env.settle()
        .args(["config", "set", "app-id", "from-file"])
        .assert()
        .success();

    env.settle()
        .args(["config", "get", "app-id"])
        .env("SETTLE_APP_ID", "from-env")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""value":"from-env""#))
        .stdout(predicate::str::contains(r#""source":"env:SETTLE_APP_ID""#));
}

#[test]
fn test_config_set_rejects_bad_values() {
    let env = TestEnv::new();

    env.settle()
        .args(["config", "set", "timeout-ms", "500000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout-ms must be 1-120000"));

    env.settle()
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key"));

    assert!(!env.data_path().join("config.kdl").exists());
}

#[test]
fn test_output_format_from_config() {
    let env = TestEnv::new();
    env.settle()
        .args(["config", "set", "output-format", "human"])
        .assert()
        .success();

    env.settle()
        .args(["config", "get", "output-format"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("output-format = human (config)"));
}

#[test]
fn test_invalid_config_file_reports_error() {
    let env = TestEnv::new();
    std::fs::write(env.data_path().join("config.kdl"), "app-id \"unterminated").unwrap();

    env.settle()
        .args(["config", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse KDL"));
}
