//! Integration tests for the `hthome` CLI binary.
//!
//! Argument parsing, help output, shell completions, config handling and
//! one end-to-end run against a mock cloud.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `hthome` binary with env isolation.
///
/// Clears all `HTHOME_*` env vars and points the config file at `config`
/// so tests never touch the user's real configuration.
fn hthome_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hthome");
    cmd.env("HTHOME_CONFIG", config)
        .env("HOME", "/tmp/hthome-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/hthome-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("HTHOME_ID")
        .env_remove("HTHOME_PASSWORD")
        .env_remove("HTHOME_OUTPUT")
        .env_remove("HTHOME_TIMEOUT")
        .env_remove("HTHOME_BASE_URL")
        .env_remove("HTHOME_DEVICE_STATE_REFRESH_INTERVAL")
        .env_remove("HTHOME_OPTIMISTIC_UPDATES")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = hthome_cmd(&dir.path().join("config.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let dir = tempfile::tempdir().unwrap();
    hthome_cmd(&dir.path().join("config.toml"))
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("HT Home Service")
                .and(predicate::str::contains("devices"))
                .and(predicate::str::contains("light"))
                .and(predicate::str::contains("watch")),
        );
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    hthome_cmd(&dir.path().join("config.toml"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hthome"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    hthome_cmd(&dir.path().join("config.toml"))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let dir = tempfile::tempdir().unwrap();
    hthome_cmd(&dir.path().join("config.toml"))
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    let dir = tempfile::tempdir().unwrap();
    hthome_cmd(&dir.path().join("config.toml"))
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let output = hthome_cmd(&dir.path().join("config.toml"))
        .arg("foobar")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let dir = tempfile::tempdir().unwrap();
    hthome_cmd(&dir.path().join("config.toml"))
        .args(["devices", "list", "--output", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_devices_list_without_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = hthome_cmd(&dir.path().join("config.toml"))
        .args(["devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("not configured"), "{text}");
}

#[test]
fn test_light_without_interval_is_not_configured() {
    let dir = tempfile::tempdir().unwrap();
    let output = hthome_cmd(&dir.path().join("config.toml"))
        .args(["light", "status", "L-1", "--id", "someone"])
        .env("HTHOME_PASSWORD", "pw")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("device_state_refresh_interval"), "{text}");
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_env() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    hthome_cmd(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_set_then_show_redacts_password() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "password = \"hunter2\"\n").unwrap();

    hthome_cmd(&config)
        .args(["config", "set", "id", "someone@example.com"])
        .assert()
        .success();
    hthome_cmd(&config)
        .args(["config", "set", "device_state_refresh_interval", "15"])
        .assert()
        .success();

    let output = hthome_cmd(&config)
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["id"], "someone@example.com");
    assert_eq!(shown["device_state_refresh_interval"], 15);
    assert_eq!(shown["password"], "****");
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let output = hthome_cmd(&dir.path().join("config.toml"))
        .args(["config", "set", "colour", "red"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unknown config key"));
}

#[test]
fn test_config_set_rejects_zero_interval() {
    let dir = tempfile::tempdir().unwrap();
    hthome_cmd(&dir.path().join("config.toml"))
        .args(["config", "set", "device_state_refresh_interval", "0"])
        .assert()
        .failure()
        .code(2);
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_json_against_mock_cloud() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "connect.sid=t1; Path=/; HttpOnly")
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy/bearer/api/v1/user/danji/household"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultData": { "danjiList": [
                { "siteId": "S1", "dong": "101", "ho": "1203", "isApproved": true }
            ] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getctoctoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy/ctoc/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "deviceList": [
                { "id": "L-1", "deviceType": "light", "deviceLocation": "Living room" },
                { "id": "G-1", "deviceType": "gas", "deviceLocation": "Kitchen" }
            ] }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        hthome_cmd(&config)
            .args(["devices", "list", "-o", "json"])
            .args(["--id", "someone@example.com", "--refresh-interval", "10"])
            .args(["--base-url", &uri])
            .env("HTHOME_PASSWORD", "pw")
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let devices: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let devices = devices.as_array().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0]["id"], "L-1");
    assert_eq!(devices[0]["supported"], true);
    assert_eq!(devices[1]["supported"], false);
}
