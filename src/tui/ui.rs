//! Stateless UI rendering for the terminal client.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tictactoe_core::{Board, Mark, Square};

use super::app::App;

/// Renders title, board, scoreboard and status.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(11),   // Board
            Constraint::Length(3), // Score
            Constraint::Length(3), // Status
            Constraint::Length(1), // Help
        ])
        .split(area);

    let game = app.session().game();
    let title = Paragraph::new(format!("Tic-Tac-Toe  ·  {}", game.difficulty()))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let locked = app.session().is_input_locked();
    draw_board(frame, chunks[1], game.board(), app.cursor(), locked);

    let score = app.session().scoreboard();
    let score_text = Paragraph::new(format!(
        "You {}  ·  Computer {}  ·  Draws {}",
        score.human, score.computer, score.draws
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Score"));
    frame.render_widget(score_text, chunks[2]);

    let status_style = if game.outcome().is_terminal() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let status = Paragraph::new(app.status_message())
        .style(status_style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[3]);

    let help = Paragraph::new("arrows/1-9 move · enter play · d difficulty · r restart · q quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[4]);
}

fn draw_board(frame: &mut Frame, area: Rect, board: &Board, cursor: usize, locked: bool) {
    let board_area = center_rect(area, 40, 11);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(board_area);

    for (row, chunk) in [rows[0], rows[2], rows[4]].into_iter().enumerate() {
        draw_row(frame, chunk, board, cursor, locked, row * 3);
    }
    draw_separator(frame, rows[1]);
    draw_separator(frame, rows[3]);
}

fn draw_row(frame: &mut Frame, area: Rect, board: &Board, cursor: usize, locked: bool, first: usize) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
        ])
        .split(area);

    draw_cell(frame, cols[0], board, cursor, locked, first);
    draw_separator_vertical(frame, cols[1]);
    draw_cell(frame, cols[2], board, cursor, locked, first + 1);
    draw_separator_vertical(frame, cols[3]);
    draw_cell(frame, cols[4], board, cursor, locked, first + 2);
}

fn draw_cell(frame: &mut Frame, area: Rect, board: &Board, cursor: usize, locked: bool, index: usize) {
    let (symbol, base_style) = match board.get(index) {
        Some(Square::Occupied(Mark::X)) => {
            (" X ", Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD))
        }
        Some(Square::Occupied(Mark::O)) => {
            (" O ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        }
        _ => ("   ", Style::default().fg(Color::DarkGray)),
    };

    // No cursor while the computer is thinking.
    let style = if index == cursor && !locked {
        base_style.bg(Color::White).fg(Color::Black)
    } else {
        base_style
    };

    let paragraph = Paragraph::new(Line::from(Span::styled(symbol, style)))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn draw_separator(frame: &mut Frame, area: Rect) {
    let sep = Paragraph::new("──────────────────────────────────────")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, area);
}

fn draw_separator_vertical(frame: &mut Frame, area: Rect) {
    let sep = Paragraph::new("│\n│\n│").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, area);
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vert[1])[1]
}
