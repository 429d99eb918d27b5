//! CLI command definitions and dispatch.

pub mod add;
pub mod config;
pub mod delete;
pub mod edit;
pub mod list;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use sharehub_core::config::AppConfig;
use sharehub_core::error::AppError;
use sharehub_entity::share::{ShareRecord, UseLimit};
use sharehub_ledger::{JsonFileStore, Ledger, LedgerOptions};
use sharehub_service::ShareAdminService;

use crate::output::OutputFormat;

/// ShareHub admin tool: publish paths under share tokens.
#[derive(Debug, Parser)]
#[command(name = "sharehub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SHAREHUB_CONFIG")]
    pub config: Option<String>,

    /// Ledger file (overrides `ledger.path`)
    #[arg(short, long)]
    pub ledger: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List all shares
    #[command(visible_alias = "l")]
    List,
    /// Publish a path under a chosen token
    Add(add::AddArgs),
    /// Publish a path under a random token
    #[command(visible_aliases = ["random", "addr"])]
    AddRandom(add::AddRandomArgs),
    /// Remove a share
    #[command(visible_aliases = ["del", "remove", "rm"])]
    Delete(delete::DeleteArgs),
    /// Change an existing share
    Edit(edit::EditArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = self.load_config()?;
        match &self.command {
            Commands::Config(args) => config::execute(args, &config, self.format),
            Commands::List => list::execute(&admin(&config).await?, self.format).await,
            Commands::Add(args) => add::execute(&admin(&config).await?, args, self.format).await,
            Commands::AddRandom(args) => {
                add::execute_random(&admin(&config).await?, args, self.format).await
            }
            Commands::Delete(args) => delete::execute(&admin(&config).await?, args).await,
            Commands::Edit(args) => edit::execute(&admin(&config).await?, args, self.format).await,
        }
    }

    fn load_config(&self) -> Result<AppConfig, AppError> {
        let env = std::env::var("SHAREHUB_ENV").unwrap_or_else(|_| "development".to_string());
        let mut config = AppConfig::load(self.config.as_deref(), &env)?;
        if let Some(ledger) = &self.ledger {
            config.ledger.path = ledger.clone();
        }
        Ok(config)
    }
}

/// Open the ledger named by the configuration.
async fn admin(config: &AppConfig) -> Result<ShareAdminService, AppError> {
    let store = Arc::new(JsonFileStore::new(&config.ledger.path));
    let ledger = Ledger::load(store, LedgerOptions::from(&config.ledger)).await?;
    Ok(ShareAdminService::new(Arc::new(ledger)))
}

/// Parse a use count given on the command line (`-1` = unlimited).
fn parse_uses(uses: i64) -> Result<UseLimit, AppError> {
    UseLimit::try_from(uses).map_err(AppError::validation)
}

/// Share display row for table output
#[derive(Debug, Serialize, Tabled)]
pub struct ShareRow {
    /// Token
    token: String,
    /// Target path
    path: String,
    /// Created at
    created: String,
    /// Remaining uses
    uses: String,
    /// Expiration
    expires: String,
    /// Upload flag
    upload: String,
}

impl ShareRow {
    /// Build a row; `target_exists = false` flags the path as missing.
    pub fn new(record: &ShareRecord, target_exists: bool) -> Self {
        let mut path = record.target_path.display().to_string();
        if !target_exists {
            path.push_str(" (missing)");
        }
        Self {
            token: record.token.clone(),
            path,
            created: record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            uses: record.uses.to_string(),
            expires: record
                .expires_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string()),
            upload: if record.allow_upload { "yes" } else { "no" }.to_string(),
        }
    }
}
