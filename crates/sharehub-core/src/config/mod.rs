//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! optional TOML files and `SHAREHUB__`-prefixed environment variables. Each
//! sub-module represents a logical configuration section. Every field has a
//! default so that running without any file is valid.

pub mod app;
pub mod archive;
pub mod ledger;
pub mod logging;
pub mod upload;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::archive::ArchiveConfig;
use self::ledger::LedgerConfig;
use self::logging::LoggingConfig;
use self::upload::UploadConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Share ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// ZIP export settings.
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// Upload settings.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// With an explicit `path` only that file is read (and must exist).
    /// Otherwise `config/default` and the `config/{env}` overlay are merged
    /// when present. Environment variables prefixed with `SHAREHUB__` are
    /// applied last in both cases.
    pub fn load(path: Option<&str>, env: &str) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(path) => builder.add_source(config::File::with_name(path).required(true)),
            None => builder
                .add_source(config::File::with_name("config/default").required(false))
                .add_source(config::File::with_name(&format!("config/{env}")).required(false)),
        };

        let config = builder
            .add_source(
                config::Environment::with_prefix("SHAREHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
