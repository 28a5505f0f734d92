// Views - screen layout for the dashboard
//
//   ┌ title bar ─────────────────────────────┐
//   │ chart grid (popover menus on top)      │
//   ├ logs (Normal width and up) ────────────┤
//   └ help line ─────────────────────────────┘
//
// Drawing also refreshes element bounds in the document, so the next mouse
// event is hit-tested against exactly what is on screen.

use super::app::App;
use super::components::{chart_panel, logs_panel, popover_menu, title_bar};
use super::layout::{chart_grid, Breakpoint};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

const LOGS_HEIGHT: u16 = 6;
/// Below this many rows the logs strip would squeeze the charts out
const LOGS_MIN_SCREEN_HEIGHT: u16 = 24;

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let show_logs = Breakpoint::from_width(area.width).at_least(Breakpoint::Normal)
        && area.height >= LOGS_MIN_SCREEN_HEIGHT;

    let [title, grid, logs, help] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(if show_logs { LOGS_HEIGHT } else { 0 }),
        Constraint::Length(1),
    ])
    .areas(area);

    title_bar::render(f, title, app);
    draw_charts(f, grid, area, app);
    if show_logs {
        logs_panel::render(f, logs, app);
    }
    draw_help(f, help, app);

    if let Some(toast) = &app.toast {
        toast.render(f, area, &app.theme);
    }
}

fn draw_charts(f: &mut Frame, area: Rect, screen: Rect, app: &App) {
    if app.panels.is_empty() {
        let empty = Paragraph::new("This dashboard has no charts")
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.muted));
        f.render_widget(empty, area);
        return;
    }

    let cells = chart_grid(area, app.panels.len());

    for (panel, cell) in app.panels.iter().zip(&cells) {
        match cell {
            Some(rect) => {
                app.document.set_bounds(panel.root, *rect);
                app.document.set_visible(panel.root, true);
                chart_panel::render(f, *rect, app, panel);
            }
            None => {
                app.document.set_visible(panel.root, false);
                popover_menu::hide(app, panel);
            }
        }
    }

    // Menus last so they overlap neighbouring panels
    for (panel, cell) in app.panels.iter().zip(&cells) {
        if let Some(rect) = cell {
            popover_menu::render(f, *rect, screen, app, panel);
        }
    }
}

fn draw_help(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let can_edit = app.store.state().info.can_edit;

    let mut spans = vec![
        Span::styled(" q", Style::default().fg(theme.menu_key)),
        Span::raw(" quit  "),
        Span::styled("r", Style::default().fg(theme.menu_key)),
        Span::raw(" refresh  "),
    ];
    if can_edit {
        spans.push(Span::styled("e", Style::default().fg(theme.menu_key)));
        spans.push(Span::raw(" edit  "));
    }
    spans.push(Span::styled(
        "click a chart for its menu",
        Style::default().fg(theme.muted),
    ));

    let last_action = app
        .devtools
        .last_action()
        .map(|a| {
            format!(
                "#{} {} ",
                app.devtools.dispatched(),
                chart_panel::truncate(&a, area.width as usize / 2)
            )
        })
        .unwrap_or_default();

    let [left, right] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(last_action.width() as u16),
    ])
    .areas(area);

    f.render_widget(Paragraph::new(Line::from(spans)), left);
    f.render_widget(
        Paragraph::new(last_action)
            .alignment(Alignment::Right)
            .style(Style::default().fg(theme.muted)),
        right,
    );
}
