//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::{DateTime, Utc};
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use sharehub_core::config::AppConfig;
use sharehub_entity::share::{CreateShare, ShareRecord, UseLimit};
use sharehub_ledger::{JsonFileStore, Ledger, LedgerOptions};

/// Multipart boundary used by [`TestApp::upload`].
const BOUNDARY: &str = "sharehub-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The ledger behind the router
    pub ledger: Arc<Ledger>,
    /// Scratch directory holding the ledger file and shared content
    pub dir: TempDir,
    /// Cancels running archive exports
    pub shutdown: CancellationToken,
}

impl TestApp {
    /// Create a new test application with default configuration
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a new test application; the ledger path is redirected into a
    /// fresh temp dir.
    pub async fn with_config(mut config: AppConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let ledger_path = dir.path().join("data.json");
        config.ledger.path = ledger_path.display().to_string();

        let store = Arc::new(JsonFileStore::new(&ledger_path));
        let ledger = Arc::new(
            Ledger::load(store, LedgerOptions::from(&config.ledger))
                .await
                .expect("Failed to load ledger"),
        );

        let shutdown = CancellationToken::new();
        let state = sharehub_api::AppState::new(config, Arc::clone(&ledger), shutdown.clone());
        let router = sharehub_api::build_app(state);

        Self {
            router,
            ledger,
            dir,
            shutdown,
        }
    }

    /// Path of `rel` inside the scratch directory.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file (creating parent directories) inside the scratch directory.
    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create dir");
        }
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Publish `target` under `token`.
    pub async fn share(
        &self,
        token: &str,
        target: &Path,
        uses: UseLimit,
        allow_upload: bool,
    ) -> ShareRecord {
        self.share_until(token, target, uses, allow_upload, None).await
    }

    /// Publish `target` under `token` with an expiration time.
    pub async fn share_until(
        &self,
        token: &str,
        target: &Path,
        uses: UseLimit,
        allow_upload: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> ShareRecord {
        self.ledger
            .insert(
                CreateShare {
                    token: token.to_string(),
                    target_path: target.to_path_buf(),
                    uses,
                    expires_at,
                    allow_upload,
                },
                Utc::now(),
            )
            .await
            .expect("Failed to create share")
    }

    /// Make a request with an empty body
    pub async fn request(&self, method: &str, uri: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(req).await
    }

    /// POST a multipart body with one `files` part per `(file name, contents)`.
    pub async fn upload(&self, uri: &str, files: &[(&str, &str)]) -> TestResponse {
        self.upload_field(uri, "files", files).await
    }

    /// POST a multipart body using the given field name for every part.
    pub async fn upload_field(
        &self,
        uri: &str,
        field: &str,
        files: &[(&str, &str)],
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, contents) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                     filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(contents.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map(|b| b.to_vec());

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response captured by the test client
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Body bytes, or the error that ended the body stream
    pub body: Result<Vec<u8>, axum::Error>,
}

impl TestResponse {
    /// Body bytes; panics if the stream ended with an error.
    pub fn bytes(&self) -> &[u8] {
        self.body.as_deref().expect("Body stream failed")
    }

    /// Body decoded as UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.bytes()).into_owned()
    }

    /// Body parsed as JSON (`Null` when not JSON)
    pub fn json(&self) -> Value {
        serde_json::from_slice(self.bytes()).unwrap_or(Value::Null)
    }

    /// A header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
