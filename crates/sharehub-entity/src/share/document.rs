//! Durable ledger document.
//!
//! On disk the ledger is a human-diffable JSON object:
//!
//! ```json
//! {
//!   "port": 8080,
//!   "files": {
//!     "abc123": {
//!       "path": "/srv/data",
//!       "uploadTime": 1718000000,
//!       "uses": -1,
//!       "expiration": 0,
//!       "allowUpload": false
//!     }
//!   }
//! }
//! ```
//!
//! Older writers used Go-style field names (`Path`, `UploadTime`, `AllowPost`)
//! and the oldest generation stored a bare path string per token; both decode.
//! Encoding always produces the canonical form above.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{ShareRecord, UseLimit, validate_token};

/// Errors raised while decoding a ledger document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The bytes are not a JSON document of the expected shape.
    #[error("failed to decode ledger document: {0}")]
    Decode(#[from] serde_json::Error),

    /// A record violates a ledger invariant.
    #[error("invalid share '{token}': {reason}")]
    Schema {
        /// Token of the offending record.
        token: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// In-memory form of the ledger file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerDocument {
    /// Port the server should listen on, if recorded.
    pub port: Option<u16>,
    /// Shares keyed by token.
    pub shares: BTreeMap<String, ShareRecord>,
}

impl LedgerDocument {
    /// An empty document recording only a port.
    pub fn empty(port: Option<u16>) -> Self {
        Self {
            port,
            shares: BTreeMap::new(),
        }
    }

    /// Decode and validate a document.
    pub fn decode(bytes: &[u8]) -> Result<Self, DocumentError> {
        let wire: WireDocument = serde_json::from_slice(bytes)?;

        let mut shares = BTreeMap::new();
        for (token, entry) in wire.files {
            let record = entry
                .into_record(&token)
                .map_err(|reason| DocumentError::Schema {
                    token: token.clone(),
                    reason,
                })?;
            shares.insert(token, record);
        }

        Ok(Self {
            port: (wire.port != 0).then_some(wire.port),
            shares,
        })
    }

    /// Encode to pretty-printed canonical JSON.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        let wire = WireDocument {
            port: self.port.unwrap_or(0),
            files: self
                .shares
                .iter()
                .map(|(token, record)| (token.clone(), WireEntry::Record(WireRecord::from(record))))
                .collect(),
        };
        let mut bytes = serde_json::to_vec_pretty(&wire)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireDocument {
    #[serde(default, alias = "Port")]
    port: u16,
    #[serde(default, alias = "Files")]
    files: BTreeMap<String, WireEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WireEntry {
    Record(WireRecord),
    Path(String),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    #[serde(alias = "Path")]
    path: String,
    #[serde(default, alias = "UploadTime")]
    upload_time: i64,
    #[serde(default = "unlimited_uses", alias = "Uses")]
    uses: i64,
    #[serde(default, alias = "Expiration")]
    expiration: i64,
    #[serde(
        default,
        alias = "AllowUpload",
        alias = "AllowPost",
        alias = "allowPost"
    )]
    allow_upload: bool,
}

fn unlimited_uses() -> i64 {
    -1
}

impl WireEntry {
    fn into_record(self, token: &str) -> Result<ShareRecord, String> {
        validate_token(token)?;

        let wire = match self {
            Self::Record(record) => record,
            Self::Path(path) => WireRecord {
                path,
                upload_time: 0,
                uses: -1,
                expiration: 0,
                allow_upload: false,
            },
        };

        if wire.path.is_empty() {
            return Err("path must not be empty".to_string());
        }

        Ok(ShareRecord {
            token: token.to_string(),
            target_path: PathBuf::from(wire.path),
            created_at: timestamp(wire.upload_time, "uploadTime")?,
            uses: UseLimit::try_from(wire.uses)?,
            expires_at: match wire.expiration {
                0 => None,
                secs => Some(timestamp(secs, "expiration")?),
            },
            allow_upload: wire.allow_upload,
        })
    }
}

impl From<&ShareRecord> for WireRecord {
    fn from(record: &ShareRecord) -> Self {
        Self {
            path: record.target_path.to_string_lossy().into_owned(),
            upload_time: record.created_at.timestamp(),
            uses: record.uses.into(),
            expiration: record.expires_at.map(|at| at.timestamp()).unwrap_or(0),
            allow_upload: record.allow_upload,
        }
    }
}

fn timestamp(secs: i64, field: &str) -> Result<DateTime<Utc>, String> {
    if secs < 0 {
        return Err(format!("{field} must not be negative"));
    }
    DateTime::from_timestamp(secs, 0).ok_or_else(|| format!("{field} is out of range"))
}
