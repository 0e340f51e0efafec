//! Layout and drawing: playfield, sidebar, game over, fade of cleared numbers.

use crate::app::Screen;
use crate::game::{Phase, Snapshot};
use crate::grid::Cell;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Duration;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each field cell is drawn two terminal columns wide so digits do not crowd each other.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 24;
/// Border + title + four stat lines + gap + two hint lines.
const SIDEBAR_HEIGHT: u16 = 10;

/// How long a cleared number takes to fade out.
const MATCH_FADE_MS: u32 = 300;

/// A cleared number still being drawn while it fades.
pub struct MatchFade {
    pub x: usize,
    pub y: usize,
    pub value: u8,
    /// Created on first draw, once the cell's screen position is known.
    effect: Option<Effect>,
}

impl MatchFade {
    pub fn new(x: usize, y: usize, value: u8) -> Self {
        Self {
            x,
            y,
            value,
            effect: None,
        }
    }

    pub fn done(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }
}

/// Terminal size (cols, rows) of the field for a grid of `width × height` cells.
fn playfield_size(width: usize, height: usize) -> (u16, u16) {
    let cols = u16::try_from(width).unwrap_or(u16::MAX).saturating_mul(CELL_WIDTH);
    (cols, u16::try_from(height).unwrap_or(u16::MAX))
}

/// Draw the game and, after a loss, the game-over box on top.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    snapshot: Snapshot<'_>,
    theme: &Theme,
    best: u32,
    fades: &mut Vec<MatchFade>,
    elapsed: Duration,
) {
    let area = frame.area();
    let (playfield_area, sidebar_area) = game_layout(area, &snapshot);

    draw_playfield(frame, &snapshot, theme, playfield_area);
    apply_match_fades(frame, &snapshot, theme, playfield_area, fades, elapsed);
    draw_sidebar(frame, &snapshot, theme, best, sidebar_area);

    if screen == Screen::GameOver || snapshot.phase == Phase::Over {
        draw_game_over(frame, &snapshot, theme, best, area);
    }
}

/// Centre playfield + sidebar in `area`.
fn game_layout(area: Rect, snapshot: &Snapshot<'_>) -> (Rect, Rect) {
    let (pw, ph) = playfield_size(snapshot.grid.width, snapshot.grid.height);
    let total_w = pw.saturating_add(1 + SIDEBAR_WIDTH);
    let total_h = ph.max(SIDEBAR_HEIGHT);

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
        .constraints([
            Constraint::Length(pw),
            Constraint::Length(1),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert_chunks[1]);
    (inner[0], inner[2])
}

/// Screen rect of field cell (x, y), clipped to `area`.
fn cell_rect(area: Rect, x: usize, y: usize) -> Option<Rect> {
    let rx = u16::try_from(x)
        .ok()?
        .checked_mul(CELL_WIDTH)
        .and_then(|dx| area.x.checked_add(dx))?;
    let ry = u16::try_from(y).ok().and_then(|dy| area.y.checked_add(dy))?;
    if rx >= area.right() || ry >= area.bottom() {
        return None;
    }
    Some(Rect {
        x: rx,
        y: ry,
        width: CELL_WIDTH.min(area.right() - rx),
        height: 1,
    })
}

fn cell_style(cell: Cell, theme: &Theme) -> Style {
    match cell {
        Cell::Empty => Style::default().bg(theme.bg),
        Cell::Wall => Style::default().fg(theme.wall).bg(theme.bg),
        Cell::Digit(d) => Style::default().fg(theme.digit_color(d)).bg(theme.bg).bold(),
    }
}

fn draw_playfield(frame: &mut Frame, snapshot: &Snapshot<'_>, theme: &Theme, area: Rect) {
    let buf = frame.buffer_mut();
    for (y, row) in snapshot.grid.rows().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            let Some(r) = cell_rect(area, x, y) else {
                continue;
            };
            let style = cell_style(cell, theme);
            // Walls fill the whole cell; digits sit in the left column.
            let filler = if cell == Cell::Wall { cell.glyph() } else { ' ' };
            buf[(r.x, r.y)].set_char(cell.glyph()).set_style(style);
            for col in r.x + 1..r.right() {
                buf[(col, r.y)].set_char(filler).set_style(style);
            }
        }
    }
}

/// Redraw recently cleared numbers and fade them to the background (TachyonFX).
fn apply_match_fades(
    frame: &mut Frame,
    snapshot: &Snapshot<'_>,
    theme: &Theme,
    area: Rect,
    fades: &mut Vec<MatchFade>,
    elapsed: Duration,
) {
    // A token that scrolled into the cell replaces the ghost.
    fades.retain(|f| snapshot.grid.get(f.x, f.y) == Some(Cell::Empty));

    let delta_ms = elapsed.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    for fade in fades.iter_mut() {
        let Some(rect) = cell_rect(area, fade.x, fade.y) else {
            continue;
        };
        let ghost = Cell::Digit(fade.value);
        frame.buffer_mut()[(rect.x, rect.y)]
            .set_char(ghost.glyph())
            .set_style(cell_style(ghost, theme));

        let effect = fade.effect.get_or_insert_with(|| {
            fx::fade_to(theme.bg, theme.bg, (MATCH_FADE_MS, Interpolation::Linear)).with_area(rect)
        });
        frame.render_effect(effect, rect, tfx_delta);
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    snapshot: &Snapshot<'_>,
    theme: &Theme,
    best: u32,
    area: Rect,
) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.wall).bg(theme.bg))
        .title(Span::styled(" Number Rush ", title_style));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let lines = vec![
        stat("Score:   ", format!("{:8}", snapshot.score)),
        stat("Best:    ", format!("{:8}", best.max(snapshot.score))),
        stat("Speed:   ", format!("{:8}", snapshot.tick_threshold)),
        stat("Pending: ", format!("{:8}", snapshot.pending)),
        Line::from(""),
        Line::from(Span::styled("1-9  clear oldest", hint_style)),
        Line::from(Span::styled("Q    quit", hint_style)),
    ];
    Paragraph::new(lines).render(inner, frame.buffer_mut());
}

fn draw_game_over(
    frame: &mut Frame,
    snapshot: &Snapshot<'_>,
    theme: &Theme,
    best: u32,
    area: Rect,
) {
    let popup_w = 30u16;
    let popup_h = 9u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    // Clear background
    for y in popup.y..popup.bottom() {
        for x in popup.x..popup.right() {
            frame.buffer_mut()[(x, y)]
                .set_char(' ')
                .set_style(Style::default().bg(theme.bg));
        }
    }

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" You scored {} points! ", snapshot.score),
            Style::default().fg(theme.main_fg),
        )),
    ];
    if snapshot.score > 0 && snapshot.score >= best {
        lines.push(Line::from(Span::styled(
            " Best this session! ",
            Style::default().fg(Color::Yellow).bold(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!(" Best: {} ", best),
            Style::default().fg(theme.main_fg),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R — Restart    Q — Quit ",
        Style::default().fg(theme.main_fg),
    )));
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.wall).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}
