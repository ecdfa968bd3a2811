//! fleetcache - command-line access to the fleet portal's notifications and messages.
//!
//! Every command goes through a `ResourceStore`, so listings honour the cache
//! timeout and fall back to sample data when the portal cannot be reached.

mod commands;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fleetcache_core::{ApiClient, Config};

use commands::{Cli, Stores};

/// Directory for daily rolling log files; unset means stderr only
const ENV_LOG_DIR: &str = "FLEETCACHE_LOG_DIR";

const LOG_FILE_PREFIX: &str = "fleetcache.log";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must outlive `main`'s work.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let _log_guard = init_tracing();

    let config = Config::load()?;
    info!(api = %config.api_base_url, "fleetcache starting");

    let mut client = ApiClient::with_timeout(&config.api_base_url, config.request_timeout())
        .context("Failed to build HTTP client")?;
    if let Some(token) = config.token.as_deref() {
        client = client.with_token(token);
    }

    let stores = Stores::new(client, &config);
    commands::run(cli.command, &stores).await
}
