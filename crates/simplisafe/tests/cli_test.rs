#![allow(clippy::unwrap_used)]
// Binary-level tests: run `simplisafe` against an isolated config dir and,
// where a vendor is needed, a wiremock server.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// A `simplisafe` command whose config lives under `home`.
fn simplisafe(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("simplisafe");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("SIMPLISAFE_PROFILE")
        .env_remove("SIMPLISAFE_OUTPUT")
        .env_remove("SIMPLISAFE_TIMEOUT")
        .env_remove("SIMPLISAFE_BASE_URL")
        .env_remove("SIMPLISAFE_USERNAME")
        .env_remove("SIMPLISAFE_PASSWORD");
    cmd
}

async fn vendor() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mobile/login"))
        .and(body_string_contains("name=bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return_code": 1, "session": "tok", "uid": 7
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mobile/7/locations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "locations": { "A1": {} } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mobile/7/sid/A1/get-state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response_code": 4 })))
        .mount(&server)
        .await;
    server
}

// ── Offline ─────────────────────────────────────────────────────────

#[test]
fn test_config_path_points_at_config_toml() {
    let home = tempfile::tempdir().unwrap();
    simplisafe(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_status_without_credentials_exits_with_auth_code() {
    let home = tempfile::tempdir().unwrap();
    simplisafe(home.path())
        .args(["status", "--base-url", "http://127.0.0.1:9", "--wait", "5"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No credentials configured"));
}

#[test]
fn test_unknown_profile_exits_with_config_code() {
    let home = tempfile::tempdir().unwrap();
    simplisafe(home.path())
        .args(["status", "--profile", "cabin"])
        .assert()
        .code(2);
}

// ── Against a mock vendor ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_prints_stations_as_json() {
    let server = vendor().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = simplisafe(home.path());
    cmd.env("SIMPLISAFE_PASSWORD", "pw").args([
        "status",
        "--username",
        "bob",
        "--base-url",
        &server.uri(),
        "--output",
        "json-compact",
    ]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let stations: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        stations,
        json!([{ "id": "A1", "name": "SimpliSafe (A1)", "armed": false }])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_arm_unknown_station_exits_with_not_found_code() {
    let server = vendor().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = simplisafe(home.path());
    cmd.env("SIMPLISAFE_PASSWORD", "pw").args([
        "arm",
        "ZZ",
        "--username",
        "bob",
        "--base-url",
        &server.uri(),
        "--wait",
        "2",
    ]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "{output:?}");
}
