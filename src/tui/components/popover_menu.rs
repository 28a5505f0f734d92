// Popover menu component
//
// Draws the focused chart's menu over the top-right corner of its panel and
// registers the menu geometry with the document so clicks can hit entries.

use super::chart_panel::truncate;
use crate::tui::app::{App, ChartPanel, PanelNode};
use ratatui::{
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Where the menu goes for a panel, kept inside `screen`
pub fn menu_area(panel: Rect, screen: Rect, labels: &[&str]) -> Rect {
    let widest = labels.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
    let width = (widest + 4).min(screen.width);
    let height = (labels.len() as u16 + 2).min(screen.height);

    let x = panel
        .right()
        .saturating_sub(width + 1)
        .max(screen.x)
        .min(screen.right().saturating_sub(width));
    let y = (panel.y + 1).min(screen.bottom().saturating_sub(height));

    Rect::new(x, y, width, height)
}

/// Take the menu out of hit testing
pub fn hide(app: &App, panel: &ChartPanel) {
    app.document.set_visible(panel.menu, false);
}

/// Draw the menu if the container has one to show
pub fn render(f: &mut Frame, panel_area: Rect, screen: Rect, app: &App, panel: &ChartPanel) {
    let view = panel.popover.render();
    let Some(entries) = view.menu else {
        hide(app, panel);
        return;
    };

    let labels: Vec<&str> = entries
        .iter()
        .map(|entry| match entry.node {
            PanelNode::Command(command) => command.label(),
            PanelNode::Chart(_) => "",
        })
        .collect();
    let area = menu_area(panel_area, screen, &labels);
    let inner_width = area.width.saturating_sub(2);

    // Geometry first, so hit testing matches what is on screen
    let document = &app.document;
    document.set_bounds(panel.menu, area);
    document.set_visible(panel.menu, true);
    let elements = document.ensure_children(panel.menu, entries.len());
    for (element, entry) in elements.iter().zip(&entries) {
        let row = area.y + 1 + entry.index as u16;
        let bounds = if row < area.bottom().saturating_sub(1) {
            Rect::new(area.x + 1, row, inner_width, 1)
        } else {
            Rect::default()
        };
        document.set_bounds(*element, bounds);
        document.set_z(*element, 1);
    }

    let theme = &app.theme;
    let lines: Vec<Line> = labels
        .iter()
        .map(|label| {
            Line::styled(
                format!(" {}", truncate(label, inner_width.saturating_sub(1) as usize)),
                Style::default().fg(theme.menu_fg),
            )
        })
        .collect();

    let menu = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.menu_key))
            .style(Style::default().bg(theme.menu_bg)),
    );

    f.render_widget(Clear, area);
    f.render_widget(menu, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_hugs_the_panel_corner() {
        let area = menu_area(
            Rect::new(10, 5, 40, 10),
            Rect::new(0, 0, 100, 40),
            &["Force refresh", "Remove chart"],
        );
        // 13 wide labels + 4, right edge one cell inside the panel
        assert_eq!(area, Rect::new(32, 6, 17, 4));
    }

    #[test]
    fn menu_stays_on_screen() {
        let area = menu_area(
            Rect::new(0, 18, 10, 2),
            Rect::new(0, 0, 30, 20),
            &["Expand description", "Force refresh", "Remove chart"],
        );
        assert_eq!(area.x, 0);
        assert_eq!(area.bottom(), 20);
        assert_eq!(area.width, 22);
    }
}
