//! The authoritative in-process ledger.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use sharehub_core::config::ledger::LedgerConfig;
use sharehub_entity::share::{CreateShare, LedgerDocument, ShareRecord, validate_token};

use crate::error::LedgerError;
use crate::evaluator::{Decision, Mutation, evaluate};
use crate::store::{LedgerStore, StoreFingerprint};

/// Behaviour switches applied when loading and serving the ledger.
#[derive(Debug, Clone)]
pub struct LedgerOptions {
    /// Drop records whose target no longer exists while loading.
    pub prune_missing_on_load: bool,
    /// Reload when another process rewrote the store.
    pub reload_on_external_change: bool,
    /// Create an empty ledger when the store holds nothing.
    pub create_if_missing: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            prune_missing_on_load: false,
            reload_on_external_change: true,
            create_if_missing: true,
        }
    }
}

impl From<&LedgerConfig> for LedgerOptions {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            prune_missing_on_load: config.prune_missing_on_load,
            reload_on_external_change: config.reload_on_external_change,
            create_if_missing: config.create_if_missing,
        }
    }
}

/// Result of [`Ledger::access`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Serve the request. Carries the record as it stands after consumption.
    Granted(ShareRecord),
    /// The share was expired or used up. Carries the record as it was.
    Expired(ShareRecord),
    /// No share is published under the token.
    NotFound,
}

#[derive(Debug)]
struct LedgerState {
    document: LedgerDocument,
    fingerprint: Option<StoreFingerprint>,
}

/// Token → share mapping guarded by a single lock.
///
/// Mutations are computed on a copy of the document, flushed to the store,
/// and only then swapped in. A failed flush leaves memory untouched.
#[derive(Debug)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    options: LedgerOptions,
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// Load the ledger from `store`.
    pub async fn load(
        store: Arc<dyn LedgerStore>,
        options: LedgerOptions,
    ) -> Result<Self, LedgerError> {
        let mut written = None;
        let mut document = match store.load().await? {
            Some(document) => document,
            None if options.create_if_missing => {
                let document = LedgerDocument::empty(None);
                written = Some(store.save(&document).await?);
                info!(store = %store.describe(), "Created empty ledger");
                document
            }
            None => {
                return Err(LedgerError::io(
                    format!("ledger {} does not exist", store.describe()),
                    std::io::ErrorKind::NotFound.into(),
                ));
            }
        };

        if options.prune_missing_on_load && prune_missing(&mut document).await > 0 {
            written = Some(store.save(&document).await?);
        }

        let fingerprint = match written {
            Some(fingerprint) => Some(fingerprint),
            None => store.fingerprint().await?,
        };
        info!(
            store = %store.describe(),
            shares = document.shares.len(),
            "Ledger loaded"
        );

        Ok(Self {
            store,
            options,
            state: RwLock::new(LedgerState {
                document,
                fingerprint,
            }),
        })
    }

    /// Port recorded in the ledger, if any.
    pub async fn port(&self) -> Option<u16> {
        self.state.read().await.document.port
    }

    /// Look up a share.
    pub async fn get(&self, token: &str) -> Option<ShareRecord> {
        self.state.read().await.document.shares.get(token).cloned()
    }

    /// All shares, sorted by token.
    pub async fn list(&self) -> Vec<ShareRecord> {
        self.state
            .read()
            .await
            .document
            .shares
            .values()
            .cloned()
            .collect()
    }

    /// Reload if the store was rewritten since the last load or flush.
    ///
    /// Returns whether a reload happened.
    pub async fn refresh_if_changed(&self) -> Result<bool, LedgerError> {
        if !self.options.reload_on_external_change {
            return Ok(false);
        }

        let current = self.store.fingerprint().await?;
        if self.state.read().await.fingerprint == current {
            return Ok(false);
        }

        let mut state = self.state.write().await;
        self.sync(&mut state).await
    }

    /// Evaluate and, when `consume` is set, apply the resulting mutation in
    /// one critical section.
    pub async fn access(
        &self,
        token: &str,
        now: DateTime<Utc>,
        consume: bool,
    ) -> Result<AccessOutcome, LedgerError> {
        let mut state = self.state.write().await;
        self.sync(&mut state).await?;

        let Some(record) = state.document.shares.get(token).cloned() else {
            return Ok(AccessOutcome::NotFound);
        };

        let decision = evaluate(Some(&record), now);
        let after = if consume {
            self.apply_locked(&mut state, token, decision.mutation())
                .await?
        } else {
            Some(record.clone())
        };

        Ok(match decision {
            Decision::Serve(_) => AccessOutcome::Granted(after.unwrap_or(record)),
            Decision::Expired => AccessOutcome::Expired(record),
            Decision::NotFound => AccessOutcome::NotFound,
        })
    }

    /// Apply a mutation to one share. Returns the record afterwards, `None`
    /// once deleted.
    pub async fn apply(
        &self,
        token: &str,
        mutation: Mutation,
    ) -> Result<Option<ShareRecord>, LedgerError> {
        let mut state = self.state.write().await;
        self.sync(&mut state).await?;
        self.apply_locked(&mut state, token, mutation).await
    }

    /// Flush the current document to the store.
    pub async fn save(&self) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let document = state.document.clone();
        self.commit(&mut state, document).await
    }

    /// Publish a new share. Fails if the token is taken.
    pub async fn insert(
        &self,
        share: CreateShare,
        now: DateTime<Utc>,
    ) -> Result<ShareRecord, LedgerError> {
        validate_token(&share.token).map_err(LedgerError::InvalidToken)?;

        let mut state = self.state.write().await;
        self.sync(&mut state).await?;
        if state.document.shares.contains_key(&share.token) {
            return Err(LedgerError::TokenExists(share.token));
        }

        let record = share.into_record(now);
        let mut next = state.document.clone();
        next.shares.insert(record.token.clone(), record.clone());
        self.commit(&mut state, next).await?;

        info!(token = %record.token, path = %record.target_path.display(), "Share added");
        Ok(record)
    }

    /// Remove a share, returning it.
    pub async fn remove(&self, token: &str) -> Result<ShareRecord, LedgerError> {
        let mut state = self.state.write().await;
        self.sync(&mut state).await?;

        let mut next = state.document.clone();
        let record = next
            .shares
            .remove(token)
            .ok_or_else(|| LedgerError::TokenNotFound(token.to_string()))?;
        self.commit(&mut state, next).await?;

        info!(token, "Share removed");
        Ok(record)
    }

    /// Move a share to a new token, keeping every other field.
    pub async fn rename(&self, token: &str, new_token: &str) -> Result<ShareRecord, LedgerError> {
        self.edit(token, Some(new_token), |_| {}).await
    }

    /// Edit a share in place. The token cannot be changed this way.
    pub async fn update<F>(&self, token: &str, edit: F) -> Result<ShareRecord, LedgerError>
    where
        F: FnOnce(&mut ShareRecord) + Send,
    {
        self.edit(token, None, edit).await
    }

    /// Edit a share and optionally move it to `new_token`, flushed as one
    /// mutation. Nothing changes unless every check passes.
    pub async fn edit<F>(
        &self,
        token: &str,
        new_token: Option<&str>,
        edit: F,
    ) -> Result<ShareRecord, LedgerError>
    where
        F: FnOnce(&mut ShareRecord) + Send,
    {
        if let Some(new_token) = new_token {
            validate_token(new_token).map_err(LedgerError::InvalidToken)?;
        }

        let mut state = self.state.write().await;
        self.sync(&mut state).await?;

        if !state.document.shares.contains_key(token) {
            return Err(LedgerError::TokenNotFound(token.to_string()));
        }
        let target = new_token.unwrap_or(token);
        if target != token && state.document.shares.contains_key(target) {
            return Err(LedgerError::TokenExists(target.to_string()));
        }

        let mut next = state.document.clone();
        let Some(mut record) = next.shares.remove(token) else {
            return Err(LedgerError::TokenNotFound(token.to_string()));
        };
        edit(&mut record);
        record.token = target.to_string();
        next.shares.insert(record.token.clone(), record.clone());
        self.commit(&mut state, next).await?;

        if target != token {
            info!(from = token, to = target, uses = %record.uses, "Share edited and renamed");
        } else {
            info!(token, uses = %record.uses, "Share updated");
        }
        Ok(record)
    }

    async fn apply_locked(
        &self,
        state: &mut LedgerState,
        token: &str,
        mutation: Mutation,
    ) -> Result<Option<ShareRecord>, LedgerError> {
        let mut next = state.document.clone();
        let Some(record) = next.shares.get_mut(token) else {
            return Err(LedgerError::TokenNotFound(token.to_string()));
        };

        match mutation {
            Mutation::None => return Ok(Some(record.clone())),
            Mutation::Decrement => record.uses = record.uses.decremented(),
            Mutation::Delete => {
                next.shares.remove(token);
            }
        }

        let after = next.shares.get(token).cloned();
        self.commit(state, next).await?;

        match &after {
            Some(record) => info!(token, ?mutation, uses = %record.uses, "Share consumed"),
            None => info!(token, ?mutation, "Share deleted"),
        }
        Ok(after)
    }

    async fn commit(
        &self,
        state: &mut LedgerState,
        next: LedgerDocument,
    ) -> Result<(), LedgerError> {
        let written = self.store.save(&next).await?;
        state.document = next;
        state.fingerprint = Some(written);
        Ok(())
    }

    async fn sync(&self, state: &mut LedgerState) -> Result<bool, LedgerError> {
        if !self.options.reload_on_external_change {
            return Ok(false);
        }

        let current = self.store.fingerprint().await?;
        if state.fingerprint == current {
            return Ok(false);
        }

        let document = self
            .store
            .load()
            .await?
            .unwrap_or_else(|| LedgerDocument::empty(state.document.port));
        info!(
            store = %self.store.describe(),
            shares = document.shares.len(),
            "Ledger changed externally, reloaded"
        );
        state.document = document;
        state.fingerprint = current;
        Ok(true)
    }
}

async fn prune_missing(document: &mut LedgerDocument) -> usize {
    let mut missing = Vec::new();
    for (token, record) in &document.shares {
        if matches!(tokio::fs::try_exists(&record.target_path).await, Ok(false)) {
            missing.push(token.clone());
        }
    }

    for token in &missing {
        if let Some(record) = document.shares.remove(token) {
            warn!(
                token = %token,
                path = %record.target_path.display(),
                "Pruned share with missing target"
            );
        }
    }
    missing.len()
}
