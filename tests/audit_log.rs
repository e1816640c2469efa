use std::sync::Arc;

use httpmock::MockServer;
use insta::assert_json_snapshot;
use revalidate::domain::paths::RevalidationPath;
use revalidate::infra::audit_store::FileAuditStore;
use revalidate::revalidation::{
    AUDIT_LOG_CAPACITY, DispatchMode, EndpointConfig, PathOutcome, RevalidationConfig,
    RevalidationEngine,
};
use tempfile::TempDir;

const TOKEN: &str = "s3cret";

fn engine_at(store: FileAuditStore, endpoint_url: &str) -> RevalidationEngine {
    let config = RevalidationConfig {
        site_base_url: "https://example.com".to_string(),
        cooldown_enabled: false,
        ..Default::default()
    };
    RevalidationEngine::new(config, EndpointConfig::new(endpoint_url, TOKEN), Arc::new(store))
        .expect("engine")
}

#[tokio::test]
async fn entries_survive_engine_restart() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/revalidate");
            then.status(200);
        })
        .await;
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("audit.json");

    let first = engine_at(FileAuditStore::new(&file), &server.url("/api/revalidate"));
    first
        .revalidate_path(&first.normalize("/blog/first/"), DispatchMode::Automatic)
        .await;
    drop(first);

    let second = engine_at(FileAuditStore::new(&file), &server.url("/api/revalidate"));
    let entries = second.audit().list().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "/blog/first/");
}

#[tokio::test]
async fn fifo_bound_keeps_the_most_recent_hundred() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/revalidate");
            then.status(204);
        })
        .await;
    let dir = TempDir::new().expect("temp dir");
    let engine = engine_at(
        FileAuditStore::new(dir.path().join("audit.json")),
        &server.url("/api/revalidate"),
    );

    for n in 0..150 {
        engine
            .revalidate_path(&engine.normalize(&format!("/p/{n}/")), DispatchMode::Automatic)
            .await;
    }

    let entries = engine.audit().list().await;
    assert_eq!(entries.len(), AUDIT_LOG_CAPACITY);
    assert_eq!(entries.first().map(|e| e.path.as_str()), Some("/p/149/"));
    assert_eq!(entries.last().map(|e| e.path.as_str()), Some("/p/50/"));
    assert!(entries.iter().all(|e| e.path != "/p/49/"));
}

#[tokio::test]
async fn corrupted_file_reads_empty_and_is_overwritten() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("audit.json");
    std::fs::write(&file, b"\"not a list\"").expect("seed");

    let engine = engine_at(FileAuditStore::new(&file), "http://127.0.0.1:1/api/revalidate");
    assert!(engine.audit().list().await.is_empty());

    engine
        .revalidate_path(&RevalidationPath::root(), DispatchMode::Automatic)
        .await;

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&file).expect("read")).expect("valid json");
    assert_eq!(raw.as_array().map(Vec::len), Some(1));

    std::fs::write(&file, b"{ truncated").expect("corrupt");
    assert!(engine.audit().list().await.is_empty());
}

#[tokio::test]
async fn clear_removes_the_file() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("audit.json");
    let engine = engine_at(FileAuditStore::new(&file), "http://127.0.0.1:1/api/revalidate");
    engine
        .revalidate_path(&RevalidationPath::root(), DispatchMode::Automatic)
        .await;
    assert!(file.exists());

    assert!(engine.audit().clear().await);
    assert!(!file.exists());
    assert!(engine.audit().list().await.is_empty());
}

#[tokio::test]
async fn http_entry_shape() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/revalidate");
            then.status(200).body(r#"{"revalidated":true}"#);
        })
        .await;
    let dir = TempDir::new().expect("temp dir");
    let engine = engine_at(
        FileAuditStore::new(dir.path().join("audit.json")),
        &server.url("/api/revalidate"),
    );

    let outcome = engine
        .revalidate_path(&engine.normalize("https://example.com/blog/first"), DispatchMode::Automatic)
        .await;
    let PathOutcome::Dispatched(attempt) = outcome else {
        panic!("expected a dispatch attempt");
    };

    assert_json_snapshot!(attempt, {
        ".timestamp" => "[timestamp]",
        ".request.url" => "[url]",
        ".request.headers" => "[headers]",
        ".response.headers" => "[headers]",
    }, @r###"
    {
      "timestamp": "[timestamp]",
      "path": "/blog/first/",
      "status": "success",
      "status_code": 200,
      "request": {
        "url": "[url]",
        "method": "GET",
        "headers": "[headers]",
        "timeout": 30
      },
      "response": {
        "code": 200,
        "message": "OK",
        "body": "{\"revalidated\":true}",
        "headers": "[headers]"
      }
    }
    "###);
}

#[tokio::test]
async fn transport_entry_shape() {
    let dir = TempDir::new().expect("temp dir");
    let engine = engine_at(
        FileAuditStore::new(dir.path().join("audit.json")),
        "http://127.0.0.1:1/api/revalidate",
    );

    let outcome = engine
        .revalidate_path(&engine.normalize("/blog/first/"), DispatchMode::Automatic)
        .await;
    let PathOutcome::Dispatched(attempt) = outcome else {
        panic!("expected a dispatch attempt");
    };

    assert_json_snapshot!(attempt, {
        ".timestamp" => "[timestamp]",
        ".request.headers" => "[headers]",
        ".response.message" => "[message]",
    }, @r###"
    {
      "timestamp": "[timestamp]",
      "path": "/blog/first/",
      "status": "error",
      "status_code": null,
      "request": {
        "url": "http://127.0.0.1:1/api/revalidate?token=%5Bredacted%5D&path=%2Fblog%2Ffirst%2F",
        "method": "GET",
        "headers": "[headers]",
        "timeout": 30
      },
      "response": {
        "error": true,
        "message": "[message]",
        "code": "connect"
      }
    }
    "###);
}
