//! Directory listing model.

use chrono::{DateTime, Utc};

use sharehub_core::result::AppResult;
use sharehub_entity::share::UseLimit;
use sharehub_storage::providers::DirEntryInfo;

use crate::share::ShareAccess;

/// Everything needed to render a directory page.
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    /// Share token (first URL segment).
    pub token: String,
    /// Path below the token, `/`-separated, empty at the share root.
    pub path: String,
    /// Title shown on the page.
    pub title: String,
    /// Visible entries, directories first.
    pub entries: Vec<DirEntryInfo>,
    /// Remaining uses after this request.
    pub uses: UseLimit,
    /// When the share expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the page offers an upload form.
    pub allow_upload: bool,
}

impl DirectoryListing {
    /// Read the directory behind an authorized request.
    pub async fn load(access: &ShareAccess) -> AppResult<Self> {
        let entries = access.provider.list_dir(&access.entry.path).await?;
        let title = match access.remainder.rsplit('/').next() {
            Some(last) if !last.is_empty() => last.to_string(),
            _ => access.record.target_name(),
        };

        Ok(Self {
            token: access.record.token.clone(),
            path: access.remainder.clone(),
            title,
            entries,
            uses: access.record.uses,
            expires_at: access.record.expires_at,
            allow_upload: access.record.allow_upload,
        })
    }

    /// Whether this is the share's top directory (no parent link).
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}
