//! Command-line interface for prize_tictactoe.

use clap::{Parser, Subcommand};
use tictactoe_core::Difficulty;

/// Prize Tic-Tac-Toe - beat the computer, win a promo code
#[derive(Parser, Debug)]
#[command(name = "prize_tictactoe")]
#[command(about = "Tic-tac-toe against a heuristic computer opponent", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (optional)
    #[arg(long, global = true, default_value = "prize_tictactoe.toml")]
    pub config: std::path::PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server and Telegram proxy
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Play in the terminal
    Play {
        /// Computer difficulty: easy, medium or hard
        #[arg(short, long)]
        difficulty: Option<Difficulty>,

        /// Game server URL; notifications are forwarded through it
        #[arg(long)]
        server_url: Option<String>,
    },

    /// Send a one-off message through the configured notifier
    Notify {
        /// Text to send
        message: String,

        /// Game server URL; the message is forwarded through it
        #[arg(long)]
        server_url: Option<String>,
    },
}
