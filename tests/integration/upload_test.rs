//! Integration tests for multipart uploads into shared directories.

mod helpers;

use http::StatusCode;

use sharehub_entity::share::UseLimit;

#[tokio::test]
async fn test_upload_disabled_is_method_not_allowed() {
    let app = helpers::TestApp::new().await;
    std::fs::create_dir_all(app.path("inbox")).unwrap();
    app.share("ro", &app.path("inbox"), UseLimit::Unlimited, false)
        .await;

    let response = app.upload("/ro", &[("a.txt", "a")]).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.header("allow"), Some("GET, HEAD"));
    assert!(!app.path("inbox/a.txt").exists());
}

#[tokio::test]
async fn test_upload_stores_files_without_consuming_uses() {
    let app = helpers::TestApp::new().await;
    std::fs::create_dir_all(app.path("inbox")).unwrap();
    app.share("drop", &app.path("inbox"), UseLimit::Remaining(1), true)
        .await;

    let response = app
        .upload("/drop", &[("a.txt", "first"), ("b.txt", "second")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["files"], serde_json::json!(["a.txt", "b.txt"]));
    assert_eq!(std::fs::read(app.path("inbox/a.txt")).unwrap(), b"first");
    assert_eq!(std::fs::read(app.path("inbox/b.txt")).unwrap(), b"second");

    assert_eq!(
        app.ledger.get("drop").await.unwrap().uses,
        UseLimit::Remaining(1)
    );
}

#[tokio::test]
async fn test_upload_never_overwrites() {
    let app = helpers::TestApp::new().await;
    app.write("inbox/report.pdf", b"original");
    app.share("drop", &app.path("inbox"), UseLimit::Unlimited, true)
        .await;

    let response = app.upload("/drop/", &[("report.pdf", "new")]).await;
    assert_eq!(response.status, StatusCode::OK);
    let stored = response.json()["files"][0].as_str().unwrap().to_string();
    assert_ne!(stored, "report.pdf");
    assert!(stored.starts_with("report_"));
    assert!(stored.ends_with(".pdf"));

    assert_eq!(std::fs::read(app.path("inbox/report.pdf")).unwrap(), b"original");
    assert_eq!(std::fs::read(app.path("inbox").join(&stored)).unwrap(), b"new");
}

#[tokio::test]
async fn test_upload_into_subdirectory_strips_client_paths() {
    let app = helpers::TestApp::new().await;
    std::fs::create_dir_all(app.path("inbox/sub")).unwrap();
    app.share("drop", &app.path("inbox"), UseLimit::Unlimited, true)
        .await;

    let response = app
        .upload("/drop/sub", &[("../../escape.txt", "nope")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["files"], serde_json::json!(["escape.txt"]));
    assert!(app.path("inbox/sub/escape.txt").exists());
    assert!(!app.path("escape.txt").exists());
}

#[tokio::test]
async fn test_upload_ignores_unknown_fields() {
    let app = helpers::TestApp::new().await;
    std::fs::create_dir_all(app.path("inbox")).unwrap();
    app.share("drop", &app.path("inbox"), UseLimit::Unlimited, true)
        .await;

    let response = app
        .upload_field("/drop", "attachment", &[("a.txt", "a")])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!app.path("inbox/a.txt").exists());
}

#[tokio::test]
async fn test_upload_requires_multipart_body() {
    let app = helpers::TestApp::new().await;
    std::fs::create_dir_all(app.path("inbox")).unwrap();
    app.share("drop", &app.path("inbox"), UseLimit::Unlimited, true)
        .await;

    let response = app.request("POST", "/drop").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_upload_to_file_share_is_rejected() {
    let app = helpers::TestApp::new().await;
    let file = app.write("single.txt", b"x");
    app.share("file", &file, UseLimit::Unlimited, true).await;

    let response = app.upload("/file", &[("a.txt", "a")]).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_to_unknown_token_is_not_found() {
    let app = helpers::TestApp::new().await;
    let response = app.upload("/ghost", &[("a.txt", "a")]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
