//! artrash bot - Telegram frontend for the art/junk feedback pipeline.

use anyhow::Result;
use artrash_bot::{
    config::{Config, Stage},
    dispatch, logging,
    state::AppState,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use logging::{LogConfig, LogFormat};

/// Telegram bot that classifies images as art or junk and records your
/// verdict.
#[derive(Parser, Debug)]
#[command(name = "artrash-bot")]
#[command(about = "Art-or-junk classification feedback bot")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(cli.debug, cli.trace, cli.quiet, cli.log_format);
    logging::init(&log_config);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    info!(
        target: "artrash::startup",
        db = %config.db_path.display(),
        "Loaded configuration"
    );

    let state = Arc::new(AppState::new(config)?);
    info!(target: "artrash::startup", "Initialized application state");

    // Long polling is a dev convenience; prod deployments get updates
    // pushed by their hosting platform.
    match state.config.stage {
        Stage::Dev => run_poll_loop(state).await,
        Stage::Prod => {
            info!(target: "artrash::startup", "Stage is prod; not starting the long-poll loop")
        }
    }
    info!(target: "artrash::startup", "Shutting down");
    Ok(())
}

/// Long-poll getUpdates until ctrl-c; each update is handled in its own
/// task so slow chats do not block each other.
async fn run_poll_loop(state: Arc<AppState>) {
    let timeout = state.config.poll_timeout_secs;
    let mut offset: i64 = 0;

    loop {
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            result = state.transport.get_updates(offset, timeout) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                error!(target: "artrash::transport", error = %e, "getUpdates failed; backing off");
                tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let state = Arc::clone(&state);
            tokio::spawn(dispatch::handle_update(state, update));
        }
    }
}
