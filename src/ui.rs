//! Layout and drawing: board, sidebar (next preview, stats, controls), start / pause / game-over overlays.

use crate::game::{Game, Status};
use crate::grid::Cell;
use crate::piece::Piece;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each grid cell is two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;
const BLOCK: &str = "██";

const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the row flash after a line clear.
const LINE_CLEAR_FADE_MS: u32 = 180;

/// Next preview: room for the widest (4) and tallest (2) spawn shape.
const NEXT_PREVIEW_COLS: u16 = 4;
const NEXT_PREVIEW_ROWS: u16 = 2;

/// Outer size (with border) of the board for a grid.
fn board_outer_size(cols: usize, rows: usize) -> (u16, u16) {
    (
        board_span(cols, CELL_WIDTH).saturating_add(2),
        board_span(rows, CELL_HEIGHT).saturating_add(2),
    )
}

/// Terminal cells covered by `n` grid cells of size `unit`, clamped to u16.
fn board_span(n: usize, unit: u16) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX).saturating_mul(unit)
}

/// Brief flash over rows that were just cleared.
#[derive(Default)]
pub struct LineClearFlash {
    rows: Vec<usize>,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl LineClearFlash {
    pub fn start(&mut self, rows: Vec<usize>) {
        self.rows = rows;
        self.effect = None;
        self.last_process = None;
    }

    pub fn is_active(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Drop the effect once it has run to completion.
    pub fn finish_if_done(&mut self) {
        if self.effect.as_ref().is_some_and(Effect::done) {
            *self = Self::default();
        }
    }
}

/// Board rect (inside border) for the centred game layout in `area`.
fn board_rect(area: Rect, game: &Game) -> Rect {
    let (cols, rows) = (game.grid().cols(), game.grid().rows());
    let (bw, bh) = board_outer_size(cols, rows);
    let total_w = bw.saturating_add(SIDEBAR_WIDTH);
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(bh) / 2;
    Rect {
        x: x.saturating_add(1),
        y: y.saturating_add(1),
        width: board_span(cols, CELL_WIDTH).min(area.width.saturating_sub(2)),
        height: board_span(rows, CELL_HEIGHT).min(area.height.saturating_sub(2)),
    }
}

/// Draw the whole screen for the current game status.
pub fn draw(frame: &mut Frame, game: &Game, theme: &Theme, flash: &mut LineClearFlash, now: Instant) {
    let area = frame.area();
    draw_game(frame, game, theme, area);
    if flash.is_active() {
        apply_line_clear_effect(frame, game, theme, area, flash, now);
    }
    match game.status() {
        Status::NotStarted => draw_start_overlay(frame, theme, area),
        Status::Running => {}
        Status::Paused => draw_pause_overlay(frame, theme, area),
        Status::GameOver => draw_game_over(frame, game, theme, area),
    }
}

fn apply_line_clear_effect(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    area: Rect,
    flash: &mut LineClearFlash,
    now: Instant,
) {
    let board = board_rect(area, game);
    let delta = flash
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    flash.last_process = Some(now);

    if flash.effect.is_none() {
        let ys: HashSet<u16> = flash
            .rows
            .iter()
            .map(|&r| board.y.saturating_add(board_span(r, CELL_HEIGHT)))
            .collect();
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| ys.contains(&pos.y)));
        let effect = fx::fade_to(
            theme.title,
            Color::White,
            (LINE_CLEAR_FADE_MS, Interpolation::Linear),
        )
        .with_filter(filter)
        .with_area(board);
        flash.effect = Some(effect);
    }

    if let Some(effect) = flash.effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

/// Board + sidebar, centred in `area`.
fn draw_game(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let (bw, bh) = board_outer_size(game.grid().cols(), game.grid().rows());
    let total_w = bw.saturating_add(SIDEBAR_WIDTH);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);

    draw_board(frame, game, theme, inner[0]);
    draw_sidebar(frame, game, theme, inner[1]);
}

fn draw_board(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Blockfall ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    let empty = Style::default().bg(theme.bg);
    for (row, cells) in game.grid().iter_rows().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let style = match cell {
                Cell::Block(id) => {
                    let c = theme.piece_color(*id);
                    Style::default().fg(c).bg(theme.bg)
                }
                Cell::Empty => empty,
            };
            let symbol = if cell.is_empty() { "  " } else { BLOCK };
            put_cell(buf, inner, row as i32, col as i32, symbol, style);
        }
    }

    if let Some(piece) = game.current() {
        let style = Style::default().fg(theme.piece_color(piece.color_id())).bg(theme.bg);
        for (row, col) in piece.cells() {
            put_cell(buf, inner, row, col, BLOCK, style);
        }
    }
}

/// Write one grid cell; silently skips cells outside `board` (e.g. above the top row).
fn put_cell(
    buf: &mut ratatui::buffer::Buffer,
    board: Rect,
    row: i32,
    col: i32,
    symbol: &str,
    style: Style,
) {
    let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
        return;
    };
    let x = board.x.saturating_add(board_span(col, CELL_WIDTH));
    let y = board.y.saturating_add(board_span(row, CELL_HEIGHT));
    if x.saturating_add(CELL_WIDTH) <= board.right() && y < board.bottom() {
        buf.set_string(x, y, symbol, style);
    }
}

fn sidebar_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn draw_sidebar(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let dim_style = Style::default().fg(theme.inactive_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Next (border + title + preview)
            Constraint::Length(1), // gap
            Constraint::Length(6), // Stats
            Constraint::Length(1), // gap
            Constraint::Min(0),    // Controls
        ])
        .split(area);

    // --- Next ---
    let next_block = sidebar_block(theme);
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let next_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(NEXT_PREVIEW_ROWS)])
        .split(next_inner);
    Paragraph::new(Line::from(Span::styled("Next", title_style)))
        .render(next_layout[0], frame.buffer_mut());
    draw_next_preview(frame, game.next(), theme, next_layout[1]);

    // --- Stats ---
    let stats_block = sidebar_block(theme);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let progress = game.progress();
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let stats = vec![
        stat("Score: ", progress.score.to_string()),
        stat("Level: ", progress.level.to_string()),
        stat("Lines: ", progress.lines.to_string()),
        stat("Speed: ", format!("{} ms", game.drop_interval().as_millis())),
    ];
    Paragraph::new(Text::from(stats)).render(stats_inner, frame.buffer_mut());

    // --- Controls ---
    let controls_block = sidebar_block(theme);
    let controls_inner = controls_block.inner(chunks[4]);
    controls_block.render(chunks[4], frame.buffer_mut());
    let controls = vec![
        Line::from(Span::styled("Controls", title_style)),
        Line::from(Span::styled("←/→ h/l  Move", dim_style)),
        Line::from(Span::styled("↑ k      Rotate", dim_style)),
        Line::from(Span::styled("↓ j      Soft drop", dim_style)),
        Line::from(Span::styled("Space    Hard drop", dim_style)),
        Line::from(Span::styled("P        Pause", dim_style)),
        Line::from(Span::styled("Enter/R  Restart", dim_style)),
        Line::from(Span::styled("Q        Quit", dim_style)),
    ];
    Paragraph::new(Text::from(controls)).render(controls_inner, frame.buffer_mut());
}

/// Next piece centred in a 4x2 cell box.
fn draw_next_preview(frame: &mut Frame, next: &Piece, theme: &Theme, area: Rect) {
    let shape = next.shape();
    let box_w = NEXT_PREVIEW_COLS * CELL_WIDTH;
    let off_x = (area.width.min(box_w)).saturating_sub(shape.width() as u16 * CELL_WIDTH) / 2;
    let off_y = NEXT_PREVIEW_ROWS.saturating_sub(shape.height() as u16) / 2;
    let origin = Rect {
        x: area.x + off_x,
        y: area.y + off_y,
        width: area.width.saturating_sub(off_x),
        height: area.height.saturating_sub(off_y),
    };
    let style = Style::default().fg(theme.piece_color(next.color_id()));
    for (row, col) in shape.cells() {
        put_cell(frame.buffer_mut(), origin, row as i32, col as i32, BLOCK, style);
    }
}

/// Centred popup with border, cleared background and the given lines.
fn draw_popup(frame: &mut Frame, theme: &Theme, area: Rect, width: u16, lines: Vec<Line<'static>>) {
    let height = lines.len() as u16 + 2;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    };
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_start_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " BLOCKFALL ",
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Enter — Start    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
    ];
    draw_popup(frame, theme, area, 30, lines);
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    draw_popup(frame, theme, area, 28, lines);
}

fn draw_game_over(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let progress = game.progress();
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", progress.score), fg)),
        Line::from(Span::styled(format!(" Level: {} ", progress.level), fg)),
        Line::from(Span::styled(format!(" Lines: {} ", progress.lines), fg)),
        Line::from(""),
        Line::from(Span::styled(" R — Play again    Q — Quit ", fg)),
    ];
    draw_popup(frame, theme, area, 32, lines);
}
