//! Prize Tic-Tac-Toe - Unified CLI
//!
//! Runs the game server, the terminal client, or a one-off notification.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use prize_tictactoe::{AppConfig, Notifier, TUI_LOG_FILE, client_notifier, run_tui, serve};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port } => run_server(&cli.config, host, port).await,
        Command::Play {
            difficulty,
            server_url,
        } => run_play(&cli.config, difficulty, server_url).await,
        Command::Notify {
            message,
            server_url,
        } => run_notify(&cli.config, message, server_url).await,
    }
}

/// Run the HTTP game server
async fn run_server(
    config_path: &std::path::Path,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    initialize_tracing();

    let mut config = AppConfig::load(config_path)?;
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }

    info!(?config, "Starting Prize Tic-Tac-Toe server");
    serve(config).await
}

/// Run the terminal client
async fn run_play(
    config_path: &std::path::Path,
    difficulty: Option<tictactoe_core::Difficulty>,
    server_url: Option<String>,
) -> Result<()> {
    initialize_file_tracing()?;

    let config = AppConfig::load(config_path)?;
    let difficulty = difficulty.unwrap_or(*config.difficulty());
    let notifier = client_notifier(server_url.as_deref(), &config);

    run_tui(&config, difficulty, notifier).await
}

/// Send one message and report whether it went through
#[instrument(skip(config_path, message))]
async fn run_notify(
    config_path: &std::path::Path,
    message: String,
    server_url: Option<String>,
) -> Result<()> {
    initialize_tracing();

    let config = AppConfig::load(config_path)?;
    let notifier = client_notifier(server_url.as_deref(), &config);

    if notifier.send(&message).await {
        info!("Message delivered");
        Ok(())
    } else {
        warn!("Message not delivered");
        anyhow::bail!("Notification via {} was not delivered", notifier.name())
    }
}

fn initialize_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,prize_tictactoe=debug")),
        )
        .init();
}

fn initialize_file_tracing() -> Result<()> {
    // Log to a file so output doesn't corrupt the terminal UI
    let log_file = std::fs::File::create(TUI_LOG_FILE)
        .with_context(|| format!("Failed to create {}", TUI_LOG_FILE))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}
