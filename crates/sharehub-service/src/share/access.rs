//! Share access control: resolves a token and request path, enforces use
//! limits and expiration, and consumes uses for downloads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use sharehub_core::error::AppError;
use sharehub_core::result::AppResult;
use sharehub_entity::share::ShareRecord;
use sharehub_ledger::{AccessOutcome, Decision, Ledger, evaluate};
use sharehub_storage::providers::{LocalShareProvider, ResolvedEntry};

/// What the request wants to do with the share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessIntent {
    /// GET or HEAD. Consumes a use when served.
    Download,
    /// POST. Requires uploads to be enabled; never consumes a use.
    Upload,
}

/// An authorized request against a share.
#[derive(Debug, Clone)]
pub struct ShareAccess {
    /// The share as it stands after this request (uses already consumed).
    pub record: ShareRecord,
    /// Filesystem view of the share's target.
    pub provider: LocalShareProvider,
    /// The resolved request path.
    pub entry: ResolvedEntry,
    /// Request path below the token, without leading or trailing slashes.
    pub remainder: String,
}

/// Handles public share access.
#[derive(Debug, Clone)]
pub struct AccessService {
    /// The authoritative ledger.
    ledger: Arc<Ledger>,
}

impl AccessService {
    /// Creates a new access service.
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// The ledger this service reads and mutates.
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Authorize a request for `remainder` under `token`.
    ///
    /// The path is resolved and checked before a use is consumed, so a
    /// request for a missing path never costs the share a use.
    pub async fn authorize(
        &self,
        token: &str,
        remainder: &str,
        intent: AccessIntent,
    ) -> AppResult<ShareAccess> {
        self.ledger.refresh_if_changed().await?;

        let now = Utc::now();
        let record = self
            .ledger
            .get(token)
            .await
            .ok_or_else(|| AppError::not_found(format!("Share not found: {token}")))?;

        if evaluate(Some(&record), now) == Decision::Expired {
            if intent == AccessIntent::Download {
                self.consume(token, now).await?;
            }
            return Err(AppError::share_expired());
        }

        let provider = LocalShareProvider::new(&record.target_path);
        let entry = provider.stat(remainder).await?;

        let record = match intent {
            AccessIntent::Download => match self.consume(token, now).await? {
                AccessOutcome::Granted(record) => record,
                AccessOutcome::Expired(_) => return Err(AppError::share_expired()),
                AccessOutcome::NotFound => {
                    return Err(AppError::not_found(format!("Share not found: {token}")));
                }
            },
            AccessIntent::Upload => {
                if !record.allow_upload {
                    return Err(AppError::method_not_allowed(
                        "Uploads are not enabled for this share",
                    ));
                }
                record
            }
        };

        debug!(token, path = %entry.path.display(), ?intent, "Share access granted");
        Ok(ShareAccess {
            record,
            provider,
            entry,
            remainder: remainder.trim_matches('/').to_string(),
        })
    }

    /// Evaluate and consume in a detached task so that a dropped request
    /// cannot interrupt the ledger between mutation and flush.
    async fn consume(&self, token: &str, now: DateTime<Utc>) -> AppResult<AccessOutcome> {
        let ledger = Arc::clone(&self.ledger);
        let token = token.to_string();
        let outcome = tokio::spawn(async move { ledger.access(&token, now, true).await })
            .await
            .map_err(|e| AppError::internal(format!("Ledger task failed: {e}")))??;
        Ok(outcome)
    }
}
