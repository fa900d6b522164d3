//! Layout and drawing: board, drop tweens, clear fade, sidebar, pause and game over.

use crate::app::{Screen, Stage};
use edgefall::{Coord, Edge, Engine, Quad};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is two terminal columns wide so cells look square.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;
const SIDEBAR_WIDTH: u16 = 26;
const SIDEBAR_MIN_HEIGHT: u16 = 20;

/// Duration of the clear fade (TachyonFX) in ms.
const CLEAR_FADE_MS: u32 = 350;

// One Dark chrome.
const BG: Color = Color::Rgb(0x31, 0x35, 0x3F);
const DIV_LINE: Color = Color::Rgb(0x3F, 0x44, 0x4F);
const MAIN_FG: Color = Color::Rgb(0xAB, 0xB2, 0xBF);
const TITLE: Color = Color::Rgb(0xE5, 0xC0, 0x7B);
const INACTIVE_FG: Color = Color::Rgb(0x5C, 0x63, 0x70);

/// What one frame needs to know.
pub struct View<'a> {
    pub engine: &'a Engine,
    pub stage: &'a Stage,
    pub screen: Screen,
    pub paused: bool,
    pub now: Instant,
}

/// Board size in terminal cells, border included.
fn board_outer_size(grid_size: usize) -> (u16, u16) {
    let n = grid_size as u16;
    (n * CELL_WIDTH + 2, n * CELL_HEIGHT + 2)
}

/// Draw the game, then the overlays. While cleared cells are fading, builds or
/// advances the fade effect and updates `clear_effect` / `clear_effect_time`.
pub fn draw(
    frame: &mut Frame,
    view: &View,
    clear_effect: &mut Option<Effect>,
    clear_effect_time: &mut Option<Instant>,
) {
    let area = frame.area();
    let board_rect = draw_game(frame, view, area);
    if !view.stage.fading.is_empty() {
        apply_clear_effect(frame, view, board_rect, clear_effect, clear_effect_time);
    }
    if view.paused {
        draw_pause_overlay(frame, area);
    }
    if view.screen == Screen::GameOver {
        draw_game_over(frame, view, area);
    }
}

/// Board + sidebar, centred. Returns the board's inner rect.
fn draw_game(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let (pw, ph) = board_outer_size(view.engine.grid().size());
    let total_w = pw + SIDEBAR_WIDTH;
    let total_h = ph.max(SIDEBAR_MIN_HEIGHT);

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
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);
    let board_area = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };

    let board_rect = draw_board(frame, view, board_area);
    draw_sidebar(frame, view, inner[1]);
    board_rect
}

/// Scale an RGB colour; named colours pass through.
fn dim(color: Color, factor: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let f = |c: u8| (c as f32 * factor).min(255.0) as u8;
            Color::Rgb(f(r), f(g), f(b))
        }
        other => other,
    }
}

/// Paint one board cell at terminal column `col` and row `row` of the board.
fn paint(frame: &mut Frame, board: Rect, col: i32, row: i32, symbol: &str, style: Style) {
    for dx in 0..CELL_WIDTH as i32 {
        let (x, y) = (col + dx, row);
        if x < 0 || y < 0 || x >= board.width as i32 || y >= board.height as i32 {
            continue;
        }
        let pos = Position::new(board.x + x as u16, board.y + y as u16);
        if let Some(cell) = frame.buffer_mut().cell_mut(pos) {
            cell.set_symbol(symbol).set_style(style);
        }
    }
}

fn draw_board(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let engine = view.engine;
    let grid = engine.grid();
    let stage = view.stage;
    let border = stage.backdrop.unwrap_or(DIV_LINE);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(BG))
        .title(Span::styled(" Edgefall ", Style::default().fg(TITLE)));
    let board = block.inner(area);
    block.render(area, frame.buffer_mut());

    let n = grid.size();
    let empty = Style::default().fg(DIV_LINE).bg(BG);
    for y in 0..n {
        for x in 0..n {
            paint(frame, board, (x as u16 * CELL_WIDTH) as i32, y as i32, "·", empty);
        }
    }

    for &(at, color) in &stage.fading {
        if grid.get(at).ok().flatten().is_none() {
            let style = Style::default().fg(color).bg(BG);
            paint(frame, board, (at.x as u16 * CELL_WIDTH) as i32, at.y as i32, "█", style);
        }
    }

    let px = engine.config().cell_px.max(1) as f32;
    for b in grid.blocks() {
        let Some(at) = b.coordinate() else { continue };
        let color = stage.color_of(b.color());
        let to = grid.point_of(at);
        let (col, row) = match stage.tween_to(b.id(), to) {
            Some(tween) => {
                let (tx, ty) = tween.at(view.now);
                (
                    (tx / px * CELL_WIDTH as f32).round() as i32,
                    (ty / px).round() as i32,
                )
            }
            None => ((at.x as u16 * CELL_WIDTH) as i32, at.y as i32),
        };
        // still in flight: shown, but not yet part of the settled board
        let color = if engine.is_falling(b.id()) { dim(color, 0.7) } else { color };
        let symbol = if b.is_unbreakable() { "▓" } else { "█" };
        paint(frame, board, col, row, symbol, Style::default().fg(color).bg(BG));
    }

    draw_entry_marks(frame, view.engine.generator().peek(), area, board);
    board
}

/// Arrows on the border where the next quad comes in.
fn draw_entry_marks(frame: &mut Frame, quad: &Quad, outer: Rect, board: Rect) {
    let style = Style::default().fg(TITLE).bg(BG);
    let buf = frame.buffer_mut();
    for lane in [quad.lane, quad.lane + 1] {
        let lane = lane as u16;
        let (symbol, cells): (&str, Vec<(u16, u16)>) = match quad.edge {
            Edge::Top => {
                let x = board.x + lane * CELL_WIDTH;
                ("▼", vec![(x, outer.y), (x + 1, outer.y)])
            }
            Edge::Bottom => {
                let x = board.x + lane * CELL_WIDTH;
                let y = outer.y + outer.height.saturating_sub(1);
                ("▲", vec![(x, y), (x + 1, y)])
            }
            Edge::Left => ("▶", vec![(outer.x, board.y + lane * CELL_HEIGHT)]),
            Edge::Right => {
                let x = outer.x + outer.width.saturating_sub(1);
                ("◀", vec![(x, board.y + lane * CELL_HEIGHT)])
            }
        };
        for pos in cells {
            if let Some(cell) = buf.cell_mut(pos) {
                cell.set_symbol(symbol).set_style(style);
            }
        }
    }
}

/// Buffer positions covered by fading cells.
fn fading_buffer_positions(board: Rect, fading: &[(Coord, Color)]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(at, _) in fading {
        let x0 = board.x + at.x as u16 * CELL_WIDTH;
        let y0 = board.y + at.y as u16 * CELL_HEIGHT;
        for bx in x0..(x0 + CELL_WIDTH).min(board.x + board.width) {
            for by in y0..(y0 + CELL_HEIGHT).min(board.y + board.height) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or advance the clear fade (TachyonFX: fade cleared cells to bg).
fn apply_clear_effect(
    frame: &mut Frame,
    view: &View,
    board: Rect,
    clear_effect: &mut Option<Effect>,
    clear_effect_time: &mut Option<Instant>,
) {
    let delta = clear_effect_time
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *clear_effect_time = Some(view.now);

    if clear_effect.is_none() {
        let fading = fading_buffer_positions(board, &view.stage.fading);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            fading.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_to(BG, BG, (CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        *clear_effect = Some(effect);
    }

    if let Some(effect) = clear_effect {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

fn titled_section(frame: &mut Frame, area: Rect, title: &str) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DIV_LINE).bg(BG))
        .title(Span::styled(title, Style::default().fg(TITLE)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    inner
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let fg = Style::default().fg(MAIN_FG);
    let label = Style::default().fg(TITLE);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // status
            Constraint::Length(6), // next
            Constraint::Length(9), // controls
        ])
        .split(area);

    let status = titled_section(frame, chunks[0], " Status ");
    let engine = view.engine;
    let lines = vec![
        Line::from(Span::styled(view.stage.scoreboard.clone(), fg)),
        Line::from(vec![
            Span::styled("Track: ", label),
            Span::styled(view.stage.track.clone(), fg),
        ]),
        Line::from(vec![
            Span::styled("Falling: ", label),
            Span::styled(engine.falling().to_string(), fg),
        ]),
    ];
    Paragraph::new(lines).render(status, frame.buffer_mut());

    let next = titled_section(frame, chunks[1], " Next ");
    draw_next_preview(frame, engine.generator().peek(), next);

    let controls = titled_section(frame, chunks[2], " Controls ");
    let dim_fg = Style::default().fg(INACTIVE_FG);
    let rows = [
        ("←↑→↓ hjkl", "shift"),
        ("r x i Tab", "rotate"),
        ("Space Enter", "drop"),
        ("p", "pause"),
        ("n", "new game"),
        ("q Esc", "quit"),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(format!("{keys:<12}"), fg),
                Span::styled(*what, dim_fg),
            ])
        })
        .collect();
    Paragraph::new(lines).render(controls, frame.buffer_mut());
}

fn entry_label(quad: &Quad) -> String {
    format!("from {}, lanes {}-{}", quad.edge, quad.lane + 1, quad.lane + 2)
}

/// The next quad as it will look once it has landed, plus where it enters.
fn draw_next_preview(frame: &mut Frame, quad: &Quad, area: Rect) {
    let text = entry_label(quad);
    Paragraph::new(Line::from(Span::styled(text, Style::default().fg(MAIN_FG))))
        .render(Rect { height: 1u16.min(area.height), ..area }, frame.buffer_mut());

    let origin = Rect {
        x: area.x + area.width.saturating_sub(2 * CELL_WIDTH) / 2,
        y: area.y + 2,
        width: 2 * CELL_WIDTH,
        height: 2,
    };
    for side in 0..2u16 {
        for depth in 0..2u16 {
            // depth 0 leads, so it ends up nearer the far side
            let (col, row) = match quad.edge {
                Edge::Top => (side, 1 - depth),
                Edge::Bottom => (side, depth),
                Edge::Left => (1 - depth, side),
                Edge::Right => (depth, side),
            };
            let color = quad.colors[side as usize][depth as usize];
            paint(
                frame,
                origin,
                (col * CELL_WIDTH) as i32,
                row as i32,
                "█",
                Style::default().fg(color).bg(BG),
            );
        }
    }
}

fn popup_rect(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, area: Rect) {
    let popup = popup_rect(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: Resume    Q: Quit ",
            Style::default().fg(MAIN_FG),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DIV_LINE).bg(BG)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let popup = popup_rect(area, 32, 8);
    let score = view.engine.score();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::Black).bg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Level {}  Score {}", score.level() + 1, score.points()),
            Style::default().fg(MAIN_FG),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "N: New game    Q: Quit",
            Style::default().fg(INACTIVE_FG),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DIV_LINE).bg(BG))
                .title(Span::styled(" Edgefall ", Style::default().fg(TITLE))),
        )
        .render(popup, frame.buffer_mut());
}
