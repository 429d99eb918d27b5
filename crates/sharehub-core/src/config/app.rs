//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// Port used when neither the configuration nor the ledger names one.
pub const FALLBACK_PORT: u16 = 8080;

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port. When absent the port stored in the ledger is used.
    #[serde(default)]
    pub port: Option<u16>,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

impl ServerConfig {
    /// Resolve the port to bind, preferring the configured one.
    pub fn resolve_port(&self, ledger_port: Option<u16>) -> u16 {
        self.port.or(ledger_port).unwrap_or(FALLBACK_PORT)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_shutdown_grace() -> u64 {
    30
}
