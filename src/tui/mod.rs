//! Terminal UI: play a local game against the computer.

mod app;
mod input;
mod ui;

pub use app::App;

use crate::config::AppConfig;
use crate::notify::Notifier;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tictactoe_core::Difficulty;
use tracing::{error, info, instrument};

/// File the terminal client logs to, so output doesn't corrupt the screen.
pub const TUI_LOG_FILE: &str = "prize_tictactoe_tui.log";

/// Runs the terminal client until the user quits.
#[instrument(skip(config, notifier), fields(notifier = notifier.name()))]
pub async fn run_tui(
    config: &AppConfig,
    difficulty: Difficulty,
    notifier: Arc<dyn Notifier>,
) -> Result<()> {
    info!("Starting terminal client");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(
        difficulty,
        config.thinking_delay(),
        notifier,
        StdRng::from_os_rng(),
    );
    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = ?err, "Game loop error");
    }
    res
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key.code);
        }

        app.tick(Instant::now());
        if app.should_quit() {
            return Ok(());
        }

        // Give spawned notifications a chance to run.
        tokio::task::yield_now().await;
    }
}
