//! posadmin - command-line front end for the point-of-sale admin API.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Commands;
use posadmin_core::Config;

/// Set to `1` to also write logs to a daily file under the cache directory
const ENV_LOG_FILE: &str = "POSADMIN_LOG_FILE";

const LOG_FILE_PREFIX: &str = "posadmin.log";

#[derive(Parser)]
#[command(name = "posadmin")]
#[command(about = "Point-of-sale admin client")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides config and POSADMIN_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the log file and must live until exit.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
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
    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    let log_dir = match std::env::var(ENV_LOG_FILE).as_deref() {
        Ok("1") => Some(config.cache_dir()?),
        _ => None,
    };
    let _guard = init_tracing(log_dir);
    info!(api_url = %config.api_url(), "posadmin starting");

    if let Err(e) = cli.command.execute(config, cli.json).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
