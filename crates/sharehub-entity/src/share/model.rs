//! Share record model.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of uses left on a share.
///
/// Stored on disk as an integer where `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum UseLimit {
    /// The share may be used any number of times.
    Unlimited,
    /// The share may be used this many more times. Zero is exhausted.
    Remaining(u64),
}

impl UseLimit {
    /// A share that is dead and must not be served.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Remaining(0))
    }

    /// The limit after one consumption. Unlimited stays unlimited.
    pub fn decremented(self) -> Self {
        match self {
            Self::Unlimited => Self::Unlimited,
            Self::Remaining(n) => Self::Remaining(n.saturating_sub(1)),
        }
    }

    /// Whether consuming a use changes the stored counter.
    pub fn is_counted(&self) -> bool {
        matches!(self, Self::Remaining(_))
    }
}

impl From<UseLimit> for i64 {
    fn from(limit: UseLimit) -> Self {
        match limit {
            UseLimit::Unlimited => -1,
            UseLimit::Remaining(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

impl TryFrom<i64> for UseLimit {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Unlimited),
            n if n >= 0 => Ok(Self::Remaining(n as u64)),
            n => Err(format!("uses must be -1 (unlimited) or >= 0, got {n}")),
        }
    }
}

impl fmt::Display for UseLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Remaining(n) => write!(f, "{n}"),
        }
    }
}

/// A published path bound to a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    /// Opaque, case-sensitive share token.
    pub token: String,
    /// Filesystem path the share exposes. Existence is checked per request.
    pub target_path: PathBuf,
    /// When the share was created (second precision).
    pub created_at: DateTime<Utc>,
    /// Remaining uses.
    pub uses: UseLimit,
    /// When the share stops being served.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether multipart uploads into the shared directory are accepted.
    pub allow_upload: bool,
}

impl ShareRecord {
    /// Whether the expiration time lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    /// Display name of the shared target (its final path component).
    pub fn target_name(&self) -> String {
        self.target_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.token.clone())
    }
}

/// Data required to create a new share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShare {
    /// Token to publish under.
    pub token: String,
    /// Path to expose.
    pub target_path: PathBuf,
    /// Use limit.
    pub uses: UseLimit,
    /// Expiry time (None = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// Allow uploads.
    pub allow_upload: bool,
}

impl CreateShare {
    /// Build the record, stamping the creation time.
    pub fn into_record(self, now: DateTime<Utc>) -> ShareRecord {
        ShareRecord {
            token: self.token,
            target_path: self.target_path,
            // The ledger stores whole seconds.
            created_at: DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now),
            uses: self.uses,
            expires_at: self.expires_at,
            allow_upload: self.allow_upload,
        }
    }
}

/// Check that a token can be used as the first URL path segment.
pub fn validate_token(token: &str) -> Result<(), String> {
    if token.is_empty() {
        return Err("token must not be empty".to_string());
    }
    if let Some(c) = token
        .chars()
        .find(|c| matches!(c, '/' | '?' | '#' | '\\') || c.is_whitespace() || c.is_control())
    {
        return Err(format!("token contains invalid character {c:?}"));
    }
    Ok(())
}
