use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use tempfile::TempDir;

const ENV_VARS: [&str; 4] = [
    "REVALIDATE__ENDPOINT__URL",
    "REVALIDATE__ENDPOINT__TOKEN",
    "REVALIDATE__SITE__BASE_URL",
    "REVALIDATE_CONFIG_FILE",
];

fn revalidate(audit_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("revalidate"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.arg("--audit-path")
        .arg(audit_dir.path().join("audit.json"))
        .arg("--site-base-url")
        .arg("https://example.com");
    cmd
}

#[test]
fn push_then_list_works_end_to_end() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/revalidate")
            .query_param("token", "cli-token")
            .query_param("path", "/blog/my-post/");
        then.status(200).body(r#"{"revalidated":true}"#);
    });
    let dir = TempDir::new().expect("temp dir");

    revalidate(&dir)
        .env("REVALIDATE__ENDPOINT__URL", server.url("/api/revalidate"))
        .env("REVALIDATE__ENDPOINT__TOKEN", "cli-token")
        .arg("push")
        .arg("https://example.com/blog/my-post/")
        .assert()
        .success()
        .stdout(contains("/blog/my-post/"));
    mock.assert();

    let assert = revalidate(&dir)
        .arg("logs")
        .arg("list")
        .arg("--json")
        .assert()
        .success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"path\": \"/blog/my-post/\""));
    assert!(output.contains("token=%5Bredacted%5D"));
    assert!(!output.contains("cli-token"));
}

#[test]
fn push_without_endpoint_fails() {
    let dir = TempDir::new().expect("temp dir");

    revalidate(&dir)
        .arg("push")
        .arg("/blog/")
        .assert()
        .failure()
        .stdout(contains("not configured"));
}

#[test]
fn failed_request_exits_non_zero() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/revalidate");
        then.status(500);
    });
    let dir = TempDir::new().expect("temp dir");

    revalidate(&dir)
        .arg("--endpoint-url")
        .arg(server.url("/api/revalidate"))
        .arg("--endpoint-token")
        .arg("cli-token")
        .arg("push")
        .arg("/blog/")
        .assert()
        .failure();
}

#[test]
fn logs_clear_on_empty_log_succeeds() {
    let dir = TempDir::new().expect("temp dir");

    revalidate(&dir)
        .arg("logs")
        .arg("clear")
        .assert()
        .success()
        .stdout(contains("audit log cleared"));

    revalidate(&dir)
        .arg("logs")
        .arg("list")
        .assert()
        .success()
        .stdout(contains("audit log is empty"));
}

#[test]
fn push_requires_a_target() {
    let dir = TempDir::new().expect("temp dir");

    revalidate(&dir)
        .arg("push")
        .assert()
        .failure()
        .stderr(contains("TARGET"));
}
