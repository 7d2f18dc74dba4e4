//! Layout and drawing: playfield, sidebar, next preview, pause and
//! game-over overlays, line-clear flash.

use crate::app::Screen;
use crate::game::GameState;
use crate::pieces::Piece;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is drawn as two terminal columns so cells look square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 20;

/// Duration of the line-clear flash (TachyonFX fade).
const LINE_CLEAR_FADE_MS: u32 = 350;

/// Playfield size in terminal cells (grid + border) for given board dimensions.
fn playfield_pixel_size(columns: u16, rows: u16) -> (u16, u16) {
    (columns * CELL_WIDTH + 2, rows + 2)
}

/// Playfield inner rect (board only, no border); matches draw_game layout.
fn playfield_board_rect(area: Rect, state: &GameState) -> Rect {
    let (pw, ph) = playfield_pixel_size(state.board.columns() as u16, state.board.rows() as u16);
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    let outer = Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.height),
    };
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (state.board.columns() as u16 * CELL_WIDTH).min(outer.width.saturating_sub(2)),
        height: (state.board.rows() as u16).min(outer.height.saturating_sub(2)),
    }
}

/// Draw current screen, with optional pause overlay. When `flash_rows` is
/// non-empty and animation is on, applies the TachyonFX fade over those rows
/// and updates `line_clear_effect` / `line_clear_process_time`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    area: Rect,
    flash_rows: &[usize],
    line_clear_effect: &mut Option<Effect>,
    line_clear_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
) {
    match screen {
        Screen::Playing => {
            draw_game(frame, state, theme, area);
            if paused {
                draw_pause_overlay(frame, theme, area);
            }
            if !flash_rows.is_empty() && !no_animation {
                apply_line_clear_effect(
                    frame,
                    state,
                    theme,
                    area,
                    flash_rows,
                    line_clear_effect,
                    line_clear_process_time,
                    now,
                );
            }
        }
        Screen::GameOver => {
            draw_game(frame, state, theme, area);
            draw_game_over(frame, state, theme, area);
        }
    }
}

/// Draw game: playfield + sidebar; use full area and center the board.
fn draw_game(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let (pw, ph) = playfield_pixel_size(state.board.columns() as u16, state.board.rows() as u16);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);
    let active_area = vert_chunks[1];

    let (playfield_area, sidebar_area) = {
        let inner = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
            .split(active_area);
        (inner[0], inner[1])
    };

    draw_playfield(frame, state, theme, playfield_area);
    draw_sidebar(frame, state, theme, sidebar_area);
}

fn draw_playfield(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" tetratui ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let active_cells: HashSet<(i32, i32)> = state.active.cells().collect();
    let buf = frame.buffer_mut();
    for y in 0..state.board.rows() {
        for x in 0..state.board.columns() {
            let color = if active_cells.contains(&(x as i32, y as i32)) {
                theme.piece_color(state.active.color)
            } else {
                theme.piece_color(state.board.color_at(y as i32, x as i32))
            };
            let rx = inner.x + (x as u16) * CELL_WIDTH;
            let ry = inner.y + y as u16;
            for dx in 0..CELL_WIDTH {
                if rx + dx < inner.x + inner.width && ry < inner.y + inner.height {
                    buf[(rx + dx, ry)]
                        .set_symbol("█")
                        .set_style(Style::default().fg(color).bg(color));
                }
            }
        }
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Next (border + title + preview)
            Constraint::Length(1), // gap
            Constraint::Length(6), // Stats (border + score, level, lines, speed)
            Constraint::Length(1), // gap
            Constraint::Length(6), // Keys
        ])
        .split(area);

    // --- Next (single lookahead slot) ---
    let next_outer = chunks[0];
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let next_inner = next_block.inner(next_outer);
    next_block.render(next_outer, frame.buffer_mut());
    let next_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(4)])
        .split(next_inner);
    Paragraph::new(Line::from(Span::styled("Next", title_style)))
        .render(next_layout[0], frame.buffer_mut());
    draw_piece_preview(frame, theme, next_layout[1], &state.next);

    // --- Stats ---
    let stats_outer = chunks[2];
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(stats_outer);
    stats_block.render(stats_outer, frame.buffer_mut());
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(state.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Level: ", title_style),
            Span::styled(state.level.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Lines: ", title_style),
            Span::styled(state.lines_total.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Speed: ", title_style),
            Span::styled(format!("{} ms", state.tick_interval.as_millis()), fg_style),
        ]),
    ];
    Paragraph::new(ratatui::text::Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Keys ---
    let keys_outer = chunks[4];
    let keys_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let keys_inner = keys_block.inner(keys_outer);
    keys_block.render(keys_outer, frame.buffer_mut());
    let keys_lines = vec![
        Line::from(Span::styled("←/→  move", fg_style)),
        Line::from(Span::styled("↑    rotate", fg_style)),
        Line::from(Span::styled("↓    soft drop", fg_style)),
        Line::from(Span::styled("P pause  Q quit", fg_style)),
    ];
    Paragraph::new(ratatui::text::Text::from(keys_lines)).render(keys_inner, frame.buffer_mut());
}

/// Draw a piece's shape matrix as a small block preview, centered in `area`.
fn draw_piece_preview(frame: &mut Frame, theme: &Theme, area: Rect, piece: &Piece) {
    let bh = piece.shape.len() as u16;
    let bw = piece.shape.first().map_or(0, Vec::len) as u16;
    let off_x = area.width.saturating_sub(bw * CELL_WIDTH) / 2;
    let off_y = area.height.saturating_sub(bh) / 2;
    let color = theme.piece_color(piece.color);

    for (r, row) in piece.shape.iter().enumerate() {
        for (c, &cell) in row.iter().enumerate() {
            if cell == 0 {
                continue;
            }
            let rect = Rect {
                x: area.x + off_x + (c as u16) * CELL_WIDTH,
                y: area.y + off_y + r as u16,
                width: CELL_WIDTH,
                height: 1,
            };
            if rect.right() <= area.right() && rect.bottom() <= area.bottom() {
                let p = Paragraph::new("██").style(Style::default().fg(color).bg(color));
                p.render(rect, frame.buffer_mut());
            }
        }
    }
}

/// Build set of buffer (x, y) positions covering the flashed rows.
fn flash_buffer_positions(board_rect: Rect, rows: &[usize]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &row in rows {
        let y = board_rect.y + row as u16;
        if y >= board_rect.y + board_rect.height {
            continue;
        }
        for x in board_rect.x..board_rect.x + board_rect.width {
            set.insert((x, y));
        }
    }
    set
}

/// Create or update the line-clear flash and process it (TachyonFX: fade the
/// cleared rows to the background colour).
fn apply_line_clear_effect(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    flash_rows: &[usize],
    line_clear_effect: &mut Option<Effect>,
    line_clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let board_rect = playfield_board_rect(area, state);
    let delta = line_clear_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *line_clear_process_time = Some(now);

    if line_clear_effect.is_none() {
        let flash_set = flash_buffer_positions(board_rect, flash_rows);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            flash_set.contains(&(pos.x, pos.y))
        }));
        let bg = theme.bg;
        let effect = fx::fade_to(bg, bg, (LINE_CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board_rect);
        *line_clear_effect = Some(effect);
    }

    if let Some(effect) = line_clear_effect {
        frame.render_effect(effect, board_rect, tfx_delta);
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
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
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let popup_w = 30u16;
    let popup_h = 10u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", state.score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Level: {} ", state.level),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Lines: {} ", state.lines_total),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R — Restart    Q — Quit ",
            Style::default().fg(theme.main_fg).bold(),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" tetratui ", theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}
