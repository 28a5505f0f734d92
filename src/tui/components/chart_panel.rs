// Chart panel component
//
// Draws one chart inside its popover container. The container's render
// output decides the border style (focused or not) and which children to draw.

use crate::dashboard::state::{ChartStatus, DashboardState};
use crate::tui::app::{App, ChartPanel, PanelNode};
use crate::tui::popover::FOCUSED_CLASS_NAME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// Cut `text` to at most `max_width` display cells, marking the cut with '…'
pub fn truncate(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().filter_map(|c| c.width()).sum();
    if total <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Body lines for one chart
fn chart_lines<'a>(app: &App, state: &'a DashboardState, slice_id: u64) -> Vec<Line<'a>> {
    let theme = &app.theme;
    let mut lines = Vec::new();

    let Some(slice) = state.slices.get(&slice_id) else {
        return lines;
    };

    let status = match state.charts.get(&slice_id) {
        Some(chart) => match chart.status {
            ChartStatus::Loading => Span::styled(
                format!("{} {}", app.spinner_char(), chart.status.as_str()),
                Style::default().fg(theme.chart_loading),
            ),
            ChartStatus::Rendered => {
                let rows = chart.rows.unwrap_or(0);
                let at = chart
                    .refreshed_at
                    .map(|t| t.format(" at %H:%M:%S").to_string())
                    .unwrap_or_default();
                Span::styled(
                    format!("✓ {} rows{}", rows, at),
                    Style::default().fg(theme.chart_rendered),
                )
            }
        },
        None => Span::raw(""),
    };

    let viz = if slice.viz_type.is_empty() {
        "chart"
    } else {
        slice.viz_type.as_str()
    };
    lines.push(Line::from(vec![
        Span::styled(format!("[{}] ", viz), Style::default().fg(theme.chart_badge)),
        status,
    ]));

    let mut tags = Vec::new();
    if let Some(filter) = state.filters.get(&slice_id.to_string()) {
        let columns: Vec<&str> = filter
            .as_object()
            .map(|obj| obj.keys().map(String::as_str).collect())
            .unwrap_or_default();
        tags.push(format!("filters: {}", columns.join(", ")));
    }
    if state.filter_immune_slices.contains(&slice_id) {
        tags.push("filter immune".to_string());
    }
    if state.refresh_frequency > 0 && state.timed_refresh_immune_slices.contains(&slice_id) {
        tags.push("no auto-refresh".to_string());
    }
    if !tags.is_empty() {
        lines.push(Line::styled(tags.join(" · "), Style::default().fg(theme.muted)));
    }

    if state.is_expanded(slice_id) {
        if let Some(description) = &slice.description {
            lines.push(Line::styled(
                description.as_str(),
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::ITALIC),
            ));
        }
    }

    lines
}

pub fn render(f: &mut Frame, area: Rect, app: &App, panel: &ChartPanel) {
    let theme = &app.theme;
    let state = app.store.state();
    let view = panel.popover.render();
    let focused = view.has_class(FOCUSED_CLASS_NAME);

    let name = state
        .slices
        .get(&panel.slice_id)
        .map(|s| s.name.as_str())
        .unwrap_or("?");
    let title = format!(" {} ", truncate(name, area.width.saturating_sub(4) as usize));

    let border_style = if focused {
        Style::default()
            .fg(theme.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.border)
    };

    let lines: Vec<Line> = view
        .children
        .iter()
        .flat_map(|child| match child {
            PanelNode::Chart(id) => chart_lines(app, &state, *id),
            PanelNode::Command(_) => Vec::new(),
        })
        .collect();

    let body = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(border_style)
            .title(title),
    );

    f.render_widget(body, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate("Revenue", 10), "Revenue");
        assert_eq!(truncate("Revenue by region", 8), "Revenue…");
        // Wide characters take two cells each
        assert_eq!(truncate("日本語のチャート", 5), "日本…");
        assert_eq!(truncate("abc", 0), "");
    }
}
