//! Responsive breakpoint system for TUI layout decisions.
//!
//! Single source of truth for width thresholds - no magic numbers scattered in render code.

use ratatui::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    /// < 60 cols: Split pane, minimal terminal
    Compact,
    /// 60-99 cols: Half-screen
    Normal,
    /// 100-139 cols: Full terminal
    Wide,
    /// 140+ cols: Ultrawide monitor
    UltraWide,
}

/// Shortest chart panel: border, title row, two body rows
pub const MIN_PANEL_HEIGHT: u16 = 6;

impl Breakpoint {
    pub fn from_width(width: u16) -> Self {
        match width {
            0..=59 => Breakpoint::Compact,
            60..=99 => Breakpoint::Normal,
            100..=139 => Breakpoint::Wide,
            _ => Breakpoint::UltraWide,
        }
    }

    /// Check if at least this breakpoint (inclusive)
    pub fn at_least(&self, min: Breakpoint) -> bool {
        self.ordinal() >= min.ordinal()
    }

    /// Chart grid columns at this width
    pub fn grid_columns(&self) -> u16 {
        self.ordinal() as u16 + 1
    }

    fn ordinal(&self) -> u8 {
        match self {
            Breakpoint::Compact => 0,
            Breakpoint::Normal => 1,
            Breakpoint::Wide => 2,
            Breakpoint::UltraWide => 3,
        }
    }
}

/// Lay `count` panels out in a grid filling `area`, row by row
///
/// Rows share the height evenly but never drop below [`MIN_PANEL_HEIGHT`].
/// Panels that would start below the area get `None`.
pub fn chart_grid(area: Rect, count: usize) -> Vec<Option<Rect>> {
    if count == 0 || area.width == 0 || area.height == 0 {
        return vec![None; count];
    }

    let columns = Breakpoint::from_width(area.width)
        .grid_columns()
        .min(count as u16)
        .max(1);
    let rows = (count as u16).div_ceil(columns);
    let row_height = (area.height / rows).max(MIN_PANEL_HEIGHT);
    let column_width = area.width / columns;

    (0..count)
        .map(|i| {
            let column = i as u16 % columns;
            let row = i as u16 / columns;
            let y = area.y + row * row_height;
            if y >= area.bottom() {
                return None;
            }

            // Last column and row absorb rounding leftovers
            let x = area.x + column * column_width;
            let width = if column == columns - 1 {
                area.right() - x
            } else {
                column_width
            };
            let height = if row == rows - 1 {
                area.bottom() - y
            } else {
                row_height.min(area.bottom() - y)
            };
            Some(Rect::new(x, y, width, height))
        })
        .collect()
}
