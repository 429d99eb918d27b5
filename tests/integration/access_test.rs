//! Integration tests for token resolution, use limits and expiration.

mod helpers;

use chrono::{Duration, Utc};
use http::StatusCode;

use sharehub_core::error::SHARE_EXPIRED_MESSAGE;
use sharehub_entity::share::UseLimit;

#[tokio::test]
async fn test_single_use_file_is_served_once() {
    let app = helpers::TestApp::new().await;
    let file = app.write("report.txt", b"quarterly numbers");
    app.share("abc123", &file, UseLimit::Remaining(1), false)
        .await;

    let first = app.request("GET", "/abc123").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.bytes(), b"quarterly numbers");

    let second = app.request("GET", "/abc123").await;
    assert_eq!(second.status, StatusCode::GONE);
    let body = second.json();
    assert_eq!(body["error"], "SHARE_EXPIRED");
    assert_eq!(body["message"], SHARE_EXPIRED_MESSAGE);

    assert!(app.ledger.get("abc123").await.is_none());
    let on_disk = std::fs::read_to_string(app.path("data.json")).unwrap();
    assert!(!on_disk.contains("abc123"));
}

#[tokio::test]
async fn test_head_consumes_a_use_without_body() {
    let app = helpers::TestApp::new().await;
    let file = app.write("notes.txt", b"seventeen bytes!!");
    app.share("once", &file, UseLimit::Remaining(1), false).await;

    let head = app.request("HEAD", "/once").await;
    assert_eq!(head.status, StatusCode::OK);
    assert!(head.bytes().is_empty());
    assert_eq!(head.header("content-length"), Some("17"));
    assert!(head.header("content-type").unwrap().starts_with("text/plain"));

    let get = app.request("GET", "/once").await;
    assert_eq!(get.status, StatusCode::GONE);
    assert!(app.ledger.get("once").await.is_none());
}

#[tokio::test]
async fn test_uses_are_counted_down_and_persisted() {
    let app = helpers::TestApp::new().await;
    let file = app.write("a.txt", b"a");
    app.share("three", &file, UseLimit::Remaining(3), false).await;

    assert_eq!(app.request("GET", "/three").await.status, StatusCode::OK);
    assert_eq!(
        app.ledger.get("three").await.unwrap().uses,
        UseLimit::Remaining(2)
    );

    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(app.path("data.json")).unwrap()).unwrap();
    assert_eq!(on_disk["files"]["three"]["uses"], 2);
}

#[tokio::test]
async fn test_unlimited_share_is_never_exhausted() {
    let app = helpers::TestApp::new().await;
    let file = app.write("a.txt", b"a");
    app.share("open", &file, UseLimit::Unlimited, false).await;

    for _ in 0..5 {
        assert_eq!(app.request("GET", "/open").await.status, StatusCode::OK);
    }
    assert_eq!(app.ledger.get("open").await.unwrap().uses, UseLimit::Unlimited);
}

#[tokio::test]
async fn test_expired_share_is_gone_and_removed() {
    let app = helpers::TestApp::new().await;
    let file = app.write("old.txt", b"old");
    app.share_until(
        "stale",
        &file,
        UseLimit::Unlimited,
        false,
        Some(Utc::now() - Duration::hours(1)),
    )
    .await;

    assert_eq!(app.request("GET", "/stale").await.status, StatusCode::GONE);
    assert!(app.ledger.get("stale").await.is_none());
    // Once removed the token is simply unknown.
    assert_eq!(app.request("GET", "/stale").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let app = helpers::TestApp::new().await;
    let response = app.request("GET", "/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_tokens_are_case_sensitive() {
    let app = helpers::TestApp::new().await;
    let file = app.write("a.txt", b"a");
    app.share("Token", &file, UseLimit::Unlimited, false).await;

    assert_eq!(app.request("GET", "/token").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.request("GET", "/Token").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_path_does_not_consume_a_use() {
    let app = helpers::TestApp::new().await;
    app.write("docs/readme.md", b"# docs");
    app.share("docs", &app.path("docs"), UseLimit::Remaining(1), false)
        .await;

    let response = app.request("GET", "/docs/missing.md").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.ledger.get("docs").await.unwrap().uses,
        UseLimit::Remaining(1)
    );

    let response = app.request("GET", "/docs/readme.md").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.bytes(), b"# docs");
}

#[tokio::test]
async fn test_path_traversal_is_rejected() {
    let app = helpers::TestApp::new().await;
    app.write("public/index.html", b"hi");
    app.write("secret.txt", b"password");
    app.share("pub", &app.path("public"), UseLimit::Unlimited, false)
        .await;

    let response = app.request("GET", "/pub/../secret.txt").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let response = app.request("GET", "/pub/%2E%2E/secret.txt").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_on_last_use() {
    let app = helpers::TestApp::new().await;
    let file = app.write("once.bin", &[7u8; 4096]);
    app.share("race", &file, UseLimit::Remaining(1), false).await;

    let (a, b) = tokio::join!(app.request("GET", "/race"), app.request("GET", "/race"));
    let mut statuses = [a.status, b.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::GONE]);
    assert!(app.ledger.get("race").await.is_none());
}

#[tokio::test]
async fn test_directory_listing() {
    let app = helpers::TestApp::new().await;
    app.write("photos/beach.jpg", b"jpg");
    app.write("photos/2024/ski.jpg", b"jpg");
    app.write("photos/.DS_Store", b"junk");
    app.share("pics", &app.path("photos"), UseLimit::Unlimited, true)
        .await;

    let response = app.request("GET", "/pics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header("content-type").unwrap().starts_with("text/html"));

    let html = response.text();
    assert!(html.contains("beach.jpg"));
    assert!(html.contains("href=\"/pics/2024\">2024/</a>"));
    assert!(!html.contains(".DS_Store"));
    assert!(html.contains("?download=zip"));
    assert!(html.contains("<form"));
    // Directories are listed before files.
    assert!(html.find("2024/").unwrap() < html.find("beach.jpg").unwrap());

    let nested = app.request("GET", "/pics/2024/").await;
    assert_eq!(nested.status, StatusCode::OK);
    let html = nested.text();
    assert!(html.contains("ski.jpg"));
    assert!(html.contains("href=\"/pics\">../</a>"));
}

#[tokio::test]
async fn test_unsupported_method() {
    let app = helpers::TestApp::new().await;
    let file = app.write("a.txt", b"a");
    app.share("put", &file, UseLimit::Unlimited, false).await;

    let response = app.request("DELETE", "/put").await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_external_ledger_edit_is_picked_up() {
    let app = helpers::TestApp::new().await;
    let file = app.write("late.txt", b"late");

    // Another process adds a share directly to the ledger file.
    let document = serde_json::json!({
        "port": 8080,
        "files": {
            "late": {
                "path": file.display().to_string(),
                "uploadTime": Utc::now().timestamp(),
                "uses": -1,
                "expiration": 0,
                "allowUpload": false
            }
        }
    });
    // The rewrite is longer than the empty ledger, so the change is seen
    // even with coarse modification times.
    std::fs::write(
        app.path("data.json"),
        serde_json::to_vec_pretty(&document).unwrap(),
    )
    .unwrap();

    let response = app.request("GET", "/late").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.bytes(), b"late");
}
