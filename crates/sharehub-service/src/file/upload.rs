//! Uploads into shared directories.

use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use tracing::info;

use sharehub_core::config::upload::UploadConfig;
use sharehub_core::error::AppError;
use sharehub_core::result::AppResult;
use sharehub_storage::providers::{StoredFile, sanitize_file_name};

use crate::share::ShareAccess;

/// Stores uploaded files.
#[derive(Debug, Clone)]
pub struct UploadService {
    config: UploadConfig,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Upload settings.
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Whether a multipart part should be stored as a file.
    pub fn accepts(&self, field_name: Option<&str>, file_name: Option<&str>) -> bool {
        file_name.is_some() && self.config.accepts_field(field_name.unwrap_or_default())
    }

    /// Stream one uploaded file into the directory of `access`.
    pub async fn store<S, E>(
        &self,
        access: &ShareAccess,
        raw_name: &str,
        stream: S,
    ) -> AppResult<StoredFile>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::error::Error + Send + Sync + 'static,
    {
        if !access.entry.is_dir {
            return Err(AppError::validation("Upload target is not a directory"));
        }
        let name = sanitize_file_name(raw_name)
            .ok_or_else(|| AppError::validation(format!("Invalid file name: {raw_name:?}")))?;

        let stored = access
            .provider
            .store_stream(&access.entry.path, &name, Utc::now(), stream)
            .await?;

        info!(
            token = %access.record.token,
            name = %stored.name,
            bytes = stored.size,
            "Upload stored"
        );
        Ok(stored)
    }
}
