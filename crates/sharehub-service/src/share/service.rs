//! Share administration used by the admin tool.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use sharehub_core::error::{AppError, ErrorKind};
use sharehub_core::result::AppResult;
use sharehub_entity::share::{CreateShare, ShareRecord, UseLimit};
use sharehub_ledger::{Ledger, LedgerError};

use super::expiry::parse_expiry;
use super::link::LinkService;

/// Attempts at drawing an unused random token.
const RANDOM_TOKEN_ATTEMPTS: usize = 16;

/// Request to publish a path.
#[derive(Debug, Clone)]
pub struct AddShare {
    /// Token to publish under; `None` draws a random one.
    pub token: Option<String>,
    /// Path to publish. Made absolute; must exist.
    pub path: PathBuf,
    /// Use limit.
    pub uses: UseLimit,
    /// Relative expiration (`12h`, `3d`, `never`, ...).
    pub expires: Option<String>,
    /// Accept uploads into the shared directory.
    pub allow_upload: bool,
}

/// Changes to an existing share. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct EditShare {
    /// Move the share to this token.
    pub rename: Option<String>,
    /// New use limit.
    pub uses: Option<UseLimit>,
    /// New relative expiration, `never` clears it.
    pub expires: Option<String>,
    /// New upload flag.
    pub allow_upload: Option<bool>,
}

impl EditShare {
    /// Whether the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.rename.is_none()
            && self.uses.is_none()
            && self.expires.is_none()
            && self.allow_upload.is_none()
    }
}

/// A share together with the state of its target on disk.
#[derive(Debug, Clone)]
pub struct ShareOverview {
    /// The share.
    pub record: ShareRecord,
    /// Whether the target path currently exists.
    pub target_exists: bool,
}

/// Manages the ledger on behalf of the operator.
#[derive(Debug, Clone)]
pub struct ShareAdminService {
    /// The ledger being administered.
    ledger: Arc<Ledger>,
    /// Random token source.
    links: LinkService,
}

impl ShareAdminService {
    /// Creates a new admin service.
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            links: LinkService::new(),
        }
    }

    /// All shares sorted by token.
    pub async fn list(&self) -> Vec<ShareOverview> {
        let mut overviews = Vec::new();
        for record in self.ledger.list().await {
            let target_exists = tokio::fs::try_exists(&record.target_path)
                .await
                .unwrap_or(false);
            overviews.push(ShareOverview {
                record,
                target_exists,
            });
        }
        overviews
    }

    /// Publish a path.
    pub async fn add(&self, request: AddShare) -> AppResult<ShareRecord> {
        let now = Utc::now();
        let target_path = std::path::absolute(&request.path).map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                format!("Invalid path: {}", request.path.display()),
                e,
            )
        })?;
        if !tokio::fs::try_exists(&target_path).await.unwrap_or(false) {
            return Err(AppError::validation(format!(
                "Path does not exist: {}",
                target_path.display()
            )));
        }
        let expires_at = expiry(request.expires.as_deref(), now)?;

        let share = |token: String| CreateShare {
            token,
            target_path: target_path.clone(),
            uses: request.uses,
            expires_at,
            allow_upload: request.allow_upload,
        };

        match request.token {
            Some(token) => Ok(self.ledger.insert(share(token), now).await?),
            None => {
                for _ in 0..RANDOM_TOKEN_ATTEMPTS {
                    match self
                        .ledger
                        .insert(share(self.links.generate_token()), now)
                        .await
                    {
                        Err(LedgerError::TokenExists(_)) => continue,
                        other => return Ok(other?),
                    }
                }
                Err(AppError::internal("Could not find an unused random token"))
            }
        }
    }

    /// Remove a share.
    pub async fn delete(&self, token: &str) -> AppResult<ShareRecord> {
        Ok(self.ledger.remove(token).await?)
    }

    /// Apply an edit. Field changes are applied before a rename.
    pub async fn edit(&self, token: &str, edit: EditShare) -> AppResult<ShareRecord> {
        if edit.is_empty() {
            return Err(AppError::validation("Nothing to change"));
        }
        let expires_at = edit
            .expires
            .as_deref()
            .map(|input| parse_expiry(input, Utc::now()))
            .transpose()?;

        let record = self
            .ledger
            .edit(token, edit.rename.as_deref(), |record| {
                if let Some(uses) = edit.uses {
                    record.uses = uses;
                }
                if let Some(expires_at) = expires_at {
                    record.expires_at = expires_at;
                }
                if let Some(allow_upload) = edit.allow_upload {
                    record.allow_upload = allow_upload;
                }
            })
            .await
            .map_err(|err| match err {
                LedgerError::TokenNotFound(_) => {
                    AppError::not_found(format!("Share not found: {token}"))
                }
                other => other.into(),
            })?;

        info!(token = %record.token, "Share edited");
        Ok(record)
    }
}

fn expiry(input: Option<&str>, now: DateTime<Utc>) -> AppResult<Option<DateTime<Utc>>> {
    match input {
        Some(input) => parse_expiry(input, now),
        None => Ok(None),
    }
}
