// Title bar component
//
// Renders the dashboard title with edit state and chart count.

use crate::tui::app::App;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the title bar at the top of the screen
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let state = app.store.state();

    let mut spans = vec![Span::styled(
        format!(" 📊 {}", state.info.title),
        Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
    )];
    if state.edit_mode {
        spans.push(Span::styled(
            "  [editing]",
            Style::default().fg(theme.edit_mode).add_modifier(Modifier::BOLD),
        ));
    }
    if state.has_unsaved_changes {
        spans.push(Span::styled(" ●", Style::default().fg(theme.highlight)));
    }

    let summary = format!(
        " {} chart(s) · {} filter(s) ",
        state.slice_ids.len(),
        state.filters.len()
    );

    let title = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.title))
            .title_top(Line::from(summary).right_aligned()),
    );

    f.render_widget(title, area);
}
