// Components module - reusable UI building blocks
//
// - Title bar: dashboard title, edit state, chart count
// - Chart panel: one chart body inside its popover container
// - Popover menu: the focused chart's menu overlay
// - Logs panel: recent log entries
// - Toast: transient notifications
//
// Each component is a focused, single-responsibility module.

pub mod chart_panel;
pub mod logs_panel;
pub mod popover_menu;
pub mod title_bar;
pub mod toast;

pub use toast::Toast;
