//! Integration tests for directory ZIP downloads.

mod helpers;

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use http::StatusCode;

use sharehub_core::config::AppConfig;
use sharehub_core::config::archive::ArchiveCompression;
use sharehub_entity::share::UseLimit;

/// Entry name → contents of a ZIP held in memory.
fn unzip(bytes: &[u8]) -> BTreeMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("Invalid zip");
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        entries.insert(file.name().to_string(), contents);
    }
    entries
}

async fn app_with_tree(config: AppConfig) -> helpers::TestApp {
    let app = helpers::TestApp::with_config(config).await;
    app.write("photos/a.txt", b"alpha");
    app.write("photos/b.bin", &(0..=255u8).cycle().take(300_000).collect::<Vec<_>>());
    app.write("photos/sub/c.txt", b"gamma");
    app.write("photos/.hidden", b"secret");
    app.write("photos/.git/config", b"[core]");
    app
}

#[tokio::test]
async fn test_directory_downloads_as_zip() {
    let app = app_with_tree(AppConfig::default()).await;
    app.share("abc", &app.path("photos"), UseLimit::Remaining(2), false)
        .await;

    let response = app.request("GET", "/abc?download=zip").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("application/zip"));
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=\"photos.zip\"")
    );

    let entries = unzip(response.bytes());
    assert_eq!(
        entries.keys().map(String::as_str).collect::<Vec<_>>(),
        ["a.txt", "b.bin", "sub/c.txt"]
    );
    assert_eq!(entries["a.txt"], b"alpha");
    assert_eq!(entries["b.bin"].len(), 300_000);
    assert_eq!(entries["sub/c.txt"], b"gamma");

    // A ZIP download costs exactly one use.
    assert_eq!(
        app.ledger.get("abc").await.unwrap().uses,
        UseLimit::Remaining(1)
    );
}

#[tokio::test]
async fn test_subdirectory_zip_is_named_after_it() {
    let app = app_with_tree(AppConfig::default()).await;
    app.share("abc", &app.path("photos"), UseLimit::Unlimited, false)
        .await;

    let response = app.request("GET", "/abc/sub?download=zip").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=\"sub.zip\"")
    );
    let entries = unzip(response.bytes());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries["c.txt"], b"gamma");
}

#[tokio::test]
async fn test_worker_count_does_not_change_contents() {
    let mut results = Vec::new();
    for workers in [1, 2, 4] {
        let mut config = AppConfig::default();
        config.archive.workers = workers;
        config.archive.compression = ArchiveCompression::Stored;
        let app = app_with_tree(config).await;
        for i in 0..20 {
            app.write(&format!("photos/many/{i:02}.txt"), format!("file {i}").as_bytes());
        }
        app.share("abc", &app.path("photos"), UseLimit::Unlimited, false)
            .await;

        let response = app.request("GET", "/abc?download=zip").await;
        assert_eq!(response.status, StatusCode::OK);
        results.push(unzip(response.bytes()));
    }

    assert_eq!(results[0].len(), 23);
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], results[2]);
}

#[tokio::test]
async fn test_empty_directory_gives_valid_empty_zip() {
    let app = helpers::TestApp::new().await;
    std::fs::create_dir_all(app.path("empty")).unwrap();
    app.share("void", &app.path("empty"), UseLimit::Unlimited, false)
        .await;

    let response = app.request("GET", "/void?download=zip").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(unzip(response.bytes()).is_empty());
}

#[tokio::test]
async fn test_zip_request_on_file_serves_the_file() {
    let app = helpers::TestApp::new().await;
    let file = app.write("notes.txt", b"just a file");
    app.share("one", &file, UseLimit::Unlimited, false).await;

    let response = app.request("GET", "/one?download=zip").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.bytes(), b"just a file");
    assert!(response.header("content-type").unwrap().starts_with("text/plain"));
}

#[tokio::test]
async fn test_shutdown_aborts_export() {
    let app = app_with_tree(AppConfig::default()).await;
    app.share("abc", &app.path("photos"), UseLimit::Unlimited, false)
        .await;

    app.shutdown.cancel();
    let response = app.request("GET", "/abc?download=zip").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_err());
}
