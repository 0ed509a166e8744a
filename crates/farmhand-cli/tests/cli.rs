//! End-to-end tests that run the `farmhand` binary against a mock backend.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_url(server: &MockServer) -> String {
    format!("http://127.0.0.1:{}/api/v1", server.address().port())
}

/// Run the CLI with an isolated session file, off the async runtime.
async fn run_cli(args: &[&str], api_url: &str, session_file: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_farmhand"));
    cmd.args(args)
        .arg("--api-url")
        .arg(api_url)
        .arg("--session-file")
        .arg(session_file)
        .env_remove("FARMHAND_PASSWORD")
        .env("NO_COLOR", "1");

    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute CLI"))
        .await
        .expect("CLI task panicked")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/token/"))
        .and(body_json(json!({"username": "alice", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "a1",
            "refresh": "r1"
        })))
        .mount(server)
        .await;
}

fn session_file(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("state").join("session.json")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_whoami() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/me/"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "username": "alice",
            "role": "farmer"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = session_file(&dir);
    let url = api_url(&server);

    let output = run_cli(
        &["login", "--username", "alice", "--password", "secret"],
        &url,
        &file,
    )
    .await;
    assert!(output.status.success(), "login failed: {}", stderr(&output));
    assert!(stderr(&output).contains("Logged in successfully"));
    assert!(file.exists());

    let output = run_cli(&["whoami"], &url, &file).await;
    assert!(output.status.success(), "whoami failed: {}", stderr(&output));
    assert!(stdout(&output).contains("alice"));
    assert!(stdout(&output).contains("farmer"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_whoami_without_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(&["whoami"], &api_url(&server), &session_file(&dir)).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("No active session"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_refresh_reports_expiry_and_removes_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/me/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/token/refresh/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = session_file(&dir);
    let url = api_url(&server);

    let output = run_cli(
        &["login", "--username", "alice", "--password", "secret"],
        &url,
        &file,
    )
    .await;
    assert!(output.status.success(), "login failed: {}", stderr(&output));

    let output = run_cli(&["whoami"], &url, &file).await;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Session expired"));
    assert!(!file.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_admin_stats_prints_camel_case_json() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    for (route, count) in [
        ("accounts/users/", 5),
        ("accounts/farmers/", 2),
        ("farms/farms/", 10),
        ("farms/devices/", 3),
        ("batches/batches/", 4),
        ("subscriptions/farmer-subscriptions/", 7),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/{route}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"count": count, "results": []})),
            )
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let file = session_file(&dir);
    let url = api_url(&server);

    run_cli(
        &["login", "--username", "alice", "--password", "secret"],
        &url,
        &file,
    )
    .await;

    let output = run_cli(&["stats", "admin"], &url, &file).await;
    assert!(output.status.success(), "stats failed: {}", stderr(&output));

    let stats: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(stats["totalUsers"], 5);
    assert_eq!(stats["activeSubscriptions"], 7);
    assert_eq!(stats["systemHealth"], 95);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_resource_is_rejected() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(
        &["resource", "list", "chickens"],
        &api_url(&server),
        &session_file(&dir),
    )
    .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("chickens"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_removes_session_file() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/token/blacklist/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = session_file(&dir);
    let url = api_url(&server);

    run_cli(
        &["login", "--username", "alice", "--password", "secret"],
        &url,
        &file,
    )
    .await;
    assert!(file.exists());

    let output = run_cli(&["logout"], &url, &file).await;
    assert!(output.status.success(), "logout failed: {}", stderr(&output));
    assert!(!file.exists());
}
