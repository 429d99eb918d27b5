//! ShareHub server
//!
//! Main entry point that loads the ledger and serves shares over HTTP.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use sharehub_core::config::AppConfig;
use sharehub_core::config::logging::LogFormat;
use sharehub_core::error::AppError;
use sharehub_ledger::{JsonFileStore, Ledger, LedgerOptions};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path = std::env::var("SHAREHUB_CONFIG").ok();
    let env = std::env::var("SHAREHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(config_path.as_deref(), &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ShareHub v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(JsonFileStore::new(&config.ledger.path));
    let ledger = Arc::new(Ledger::load(store, LedgerOptions::from(&config.ledger)).await?);

    let port = config.server.resolve_port(ledger.port().await);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let shutdown = CancellationToken::new();
    let state = sharehub_api::AppState::new(config, ledger, shutdown.clone());
    let app = sharehub_api::build_app(state);

    let mut server = tokio::spawn(sharehub_api::serve(listener, app, shutdown.clone()));

    tokio::select! {
        result = &mut server => {
            return result.map_err(|e| AppError::internal(format!("Server task failed: {e}")))?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            shutdown.cancel();
        }
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => {
            result.map_err(|e| AppError::internal(format!("Server task failed: {e}")))??;
            tracing::info!("ShareHub server shut down gracefully");
        }
        Err(_) => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Graceful shutdown timed out");
        }
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
