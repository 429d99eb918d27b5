//! Application state shared across all handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use sharehub_core::config::AppConfig;
use sharehub_ledger::Ledger;
use sharehub_service::{AccessService, ArchiveService, UploadService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// The share ledger
    pub ledger: Arc<Ledger>,
    /// Token and path authorization
    pub access_service: Arc<AccessService>,
    /// Multipart upload storage
    pub upload_service: Arc<UploadService>,
    /// Directory ZIP export
    pub archive_service: Arc<ArchiveService>,
}

impl AppState {
    /// Wire services around a loaded ledger. Cancelling `shutdown` aborts
    /// running archive exports.
    pub fn new(config: AppConfig, ledger: Arc<Ledger>, shutdown: CancellationToken) -> Self {
        let access_service = Arc::new(AccessService::new(Arc::clone(&ledger)));
        let upload_service = Arc::new(UploadService::new(config.upload.clone()));
        let archive_service = Arc::new(ArchiveService::new(config.archive.clone(), shutdown));

        Self {
            config: Arc::new(config),
            ledger,
            access_service,
            upload_service,
            archive_service,
        }
    }
}
