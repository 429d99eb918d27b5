//! Ledger error type.

use thiserror::Error;

use sharehub_core::error::{AppError, ErrorKind};
use sharehub_entity::share::DocumentError;

/// Errors raised by the ledger and its stores.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The durable store could not be read or written.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The stored document is corrupt or violates the schema.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The document could not be encoded.
    #[error("failed to encode ledger: {0}")]
    Encode(#[source] serde_json::Error),

    /// No share is published under this token.
    #[error("share '{0}' not found")]
    TokenNotFound(String),

    /// A share already uses this token.
    #[error("share '{0}' already exists")]
    TokenExists(String),

    /// The token cannot be used as a URL path segment.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl LedgerError {
    /// Wrap an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let kind = match &err {
            LedgerError::TokenNotFound(_) => ErrorKind::NotFound,
            LedgerError::TokenExists(_) | LedgerError::InvalidToken(_) => ErrorKind::Validation,
            LedgerError::Io { .. } | LedgerError::Document(_) | LedgerError::Encode(_) => {
                ErrorKind::Configuration
            }
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}
