//! Short-lived status message
//!
//! Anchored to the right edge, just above the help line, so it never covers
//! the chart grid's popover menus for long.

use crate::tui::components::chart_panel::truncate;
use crate::tui::theme::Theme;
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const LIFETIME: Duration = Duration::from_secs(2);

/// Border plus one blank cell on each side
const FRAME_WIDTH: u16 = 4;

/// Rows reserved under the toast for the help line
const HELP_ROWS: u16 = 1;

pub struct Toast {
    pub message: String,
    shown_at: Instant,
    lifetime: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
            lifetime: LIFETIME,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= self.lifetime
    }

    /// Where the toast lands inside `screen`
    fn placement(&self, screen: Rect) -> Rect {
        let width = (self.message.width() as u16 + FRAME_WIDTH).min(screen.width);
        let height = 3.min(screen.height);
        let x = screen.right().saturating_sub(width + 1).max(screen.x);
        let y = screen
            .bottom()
            .saturating_sub(height + HELP_ROWS)
            .max(screen.y);
        Rect::new(x, y, width, height).intersection(screen)
    }

    pub fn render(&self, f: &mut Frame, screen: Rect, theme: &Theme) {
        let area = self.placement(screen);
        let room = area.width.saturating_sub(FRAME_WIDTH) as usize;

        let body = Paragraph::new(truncate(&self.message, room))
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.foreground))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(theme.border_type)
                    .border_style(Style::default().fg(theme.highlight))
                    .style(Style::default().bg(theme.background)),
            );

        f.render_widget(Clear, area);
        f.render_widget(body, area);
    }
}
