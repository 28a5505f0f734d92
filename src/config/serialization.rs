//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Serialize config to TOML string
    pub fn to_toml(&self) -> String {
        format!(
            r#"# superdash configuration

# Theme: dark, light
theme = "{theme}"

# UI redraw interval in milliseconds
tick_ms = {tick_ms}

# Where the server puts the bootstrap payload in the host page
[bootstrap]
element_id = "{element_id}"
attribute = "{attribute}"

# Chart popover menus
[popover]
# true = clicking a chart no longer opens its menu
disable_click = {disable_click}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# File logging (in addition to the TUI log strip)
file_enabled = {file_enabled}
file_dir = "{file_dir}"
# Rotation: hourly, daily, never
file_rotation = "{file_rotation}"
file_prefix = "{file_prefix}"
"#,
            theme = self.theme,
            tick_ms = self.tick_ms,
            element_id = self.bootstrap.element_id,
            attribute = self.bootstrap.attribute,
            disable_click = self.popover.disable_click,
            log_level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            // Forward slashes keep Windows paths valid inside a TOML basic string
            file_dir = self.logging.file_dir.display().to_string().replace('\\', "/"),
            file_rotation = self.logging.file_rotation.as_str(),
            file_prefix = self.logging.file_prefix,
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }
}
