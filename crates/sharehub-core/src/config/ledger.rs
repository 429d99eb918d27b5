//! Share ledger configuration.

use serde::{Deserialize, Serialize};

/// Durable ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path of the JSON ledger file shared with the admin tool.
    #[serde(default = "default_path")]
    pub path: String,
    /// Drop records whose target path no longer exists when loading.
    #[serde(default)]
    pub prune_missing_on_load: bool,
    /// Reload the ledger when another process rewrote the file.
    #[serde(default = "default_true")]
    pub reload_on_external_change: bool,
    /// Create an empty ledger file when none exists.
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            prune_missing_on_load: false,
            reload_on_external_change: true,
            create_if_missing: true,
        }
    }
}

fn default_path() -> String {
    "./data.json".to_string()
}

fn default_true() -> bool {
    true
}
