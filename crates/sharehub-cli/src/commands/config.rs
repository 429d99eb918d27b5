//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use sharehub_core::config::AppConfig;
use sharehub_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Validate,
}

/// Execute config commands. Loading already validated `config`.
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(config)
                    .map_err(|e| AppError::internal(format!("Failed to encode config: {e}")))?;
                println!("{json}");
            }
            OutputFormat::Table => println!("{config:#?}"),
        },
        ConfigCommand::Validate => {
            output::print_success("Configuration is valid");
            let port = config
                .server
                .port
                .map(|p| p.to_string())
                .unwrap_or_else(|| "from ledger".to_string());
            output::print_kv("Server", &format!("{}:{}", config.server.host, port));
            output::print_kv("Ledger", &config.ledger.path);
            output::print_kv("Archive workers", &config.archive.effective_workers().to_string());
            output::print_kv(
                "Max upload",
                &format!("{} bytes", config.upload.max_upload_size_bytes),
            );
        }
    }
    Ok(())
}
