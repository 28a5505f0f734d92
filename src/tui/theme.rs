// Theme system for the TUI
//
// Two built-in palettes, picked by name from config. Unknown names fall back
// to the dark palette.

use crate::logging::LogLevel;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

/// Available themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeKind {
    #[default]
    Dark,
    Light,
}

impl ThemeKind {
    pub fn all() -> &'static [ThemeKind] {
        &[ThemeKind::Dark, ThemeKind::Light]
    }

    /// Look up a theme by config name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThemeKind::Dark => "dark",
            ThemeKind::Light => "light",
        }
    }

    pub fn theme(&self) -> Theme {
        match self {
            ThemeKind::Dark => Theme::dark(),
            ThemeKind::Light => Theme::light(),
        }
    }
}

/// Complete theme definition with all UI colors
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub border_type: BorderType,

    pub title: Color,
    pub muted: Color,
    pub highlight: Color,

    // Chart panels
    pub chart_loading: Color,
    pub chart_rendered: Color,
    pub chart_badge: Color,

    // Popover menu
    pub menu_bg: Color,
    pub menu_fg: Color,
    pub menu_key: Color,

    pub edit_mode: Color,

    // Log levels
    pub log_error: Color,
    pub log_warn: Color,
    pub log_info: Color,
    pub log_debug: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Resolve a configured theme name
    pub fn named(name: &str) -> Self {
        match ThemeKind::from_name(name) {
            Some(kind) => kind.theme(),
            None => {
                tracing::warn!("Unknown theme {:?}, using dark", name);
                Self::dark()
            }
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::White,
            border: Color::Gray,
            border_focused: Color::Cyan,
            border_type: BorderType::Rounded,

            title: Color::Cyan,
            muted: Color::DarkGray,
            highlight: Color::Yellow,

            chart_loading: Color::Yellow,
            chart_rendered: Color::Green,
            chart_badge: Color::Magenta,

            menu_bg: Color::DarkGray,
            menu_fg: Color::White,
            menu_key: Color::Cyan,

            edit_mode: Color::LightRed,

            log_error: Color::Red,
            log_warn: Color::Yellow,
            log_info: Color::Blue,
            log_debug: Color::Gray,
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::White,
            foreground: Color::Black,
            border: Color::DarkGray,
            border_focused: Color::Blue,
            border_type: BorderType::Plain,

            title: Color::Blue,
            muted: Color::Gray,
            highlight: Color::Rgb(184, 134, 11), // Dark goldenrod

            chart_loading: Color::Rgb(184, 134, 11),
            chart_rendered: Color::Green,
            chart_badge: Color::Magenta,

            menu_bg: Color::Rgb(220, 220, 220),
            menu_fg: Color::Black,
            menu_key: Color::Blue,

            edit_mode: Color::Red,

            log_error: Color::Red,
            log_warn: Color::Rgb(184, 134, 11),
            log_info: Color::Blue,
            log_debug: Color::DarkGray,
        }
    }

    /// Style for a log line
    pub fn log_style(&self, level: LogLevel) -> Style {
        match level {
            LogLevel::Error => Style::default()
                .fg(self.log_error)
                .add_modifier(Modifier::BOLD),
            LogLevel::Warn => Style::default().fg(self.log_warn),
            LogLevel::Info => Style::default().fg(self.log_info),
            LogLevel::Debug | LogLevel::Trace => Style::default().fg(self.log_debug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(ThemeKind::from_name("Light"), Some(ThemeKind::Light));
        assert_eq!(ThemeKind::from_name(" dark "), Some(ThemeKind::Dark));
        assert_eq!(ThemeKind::from_name("dracula"), None);
    }

    #[test]
    fn unknown_theme_falls_back_to_dark() {
        assert_eq!(Theme::named("solarized").foreground, Theme::dark().foreground);
        assert_eq!(Theme::named("light").foreground, Color::Black);
    }
}
