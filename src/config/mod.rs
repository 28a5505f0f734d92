//! Configuration for the dashboard
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/superdash/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod observability;
mod serialization;


pub use observability::{FileLogging, LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_THEME: &str = "dark";
const DEFAULT_TICK_MS: u64 = 250;

/// Shortest UI tick accepted; anything lower just burns CPU
const MIN_TICK_MS: u64 = 16;

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Theme name: "dark" or "light"
    pub theme: String,

    /// UI redraw interval in milliseconds
    pub tick_ms: u64,

    /// Where the bootstrap payload lives in the host page
    pub bootstrap: BootstrapConfig,

    /// Popover container behaviour
    pub popover: PopoverConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            tick_ms: DEFAULT_TICK_MS,
            bootstrap: BootstrapConfig::default(),
            popover: PopoverConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Host page lookup settings
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapConfig {
    /// Id of the element carrying the payload
    pub element_id: String,
    /// Attribute holding the HTML-escaped JSON payload
    pub attribute: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            element_id: "app".to_string(),
            attribute: "data-bootstrap".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileBootstrap {
    pub element_id: Option<String>,
    pub attribute: Option<String>,
}

impl BootstrapConfig {
    pub fn from_file(file: Option<FileBootstrap>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            element_id: file
                .element_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or(defaults.element_id),
            attribute: file
                .attribute
                .filter(|attr| !attr.trim().is_empty())
                .unwrap_or(defaults.attribute),
        }
    }
}

/// Popover container settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopoverConfig {
    /// Ignore clicks on the chart body; only capture listeners change focus
    pub disable_click: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct FilePopover {
    pub disable_click: Option<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub theme: Option<String>,
    pub tick_ms: Option<u64>,

    /// Optional [bootstrap] section
    pub bootstrap: Option<FileBootstrap>,

    /// Optional [popover] section
    pub popover: Option<FilePopover>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a boolean env value the way users write them
fn env_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}

impl Config {
    /// Get the config file path: ~/.config/superdash/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("superdash").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists
    ///
    /// # Exits
    /// If the config file exists but cannot be read or parsed. A broken config
    /// should fail with a clear error rather than silently fall back to defaults.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                    eprintln!("║  CONFIG ERROR - Failed to parse configuration file          ║");
                    eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                    eprintln!("  File: {}\n", path.display());
                    eprintln!("  Error: {}\n", e);
                    eprintln!("  Tip: Check for:\n");
                    eprintln!("    - Missing quotes around string values");
                    eprintln!("    - Invalid boolean values (use true/false)");
                    eprintln!("    - Typos in section names\n");
                    eprintln!("  To reset, run `superdash config --reset`.\n");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                eprintln!("║  CONFIG ERROR - Cannot read configuration file              ║");
                eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: file -> env vars -> defaults
    pub fn from_env() -> Self {
        Self::resolve(Self::load_file_config(), |key| std::env::var(key).ok())
    }

    /// Load configuration from the file alone, ignoring env overrides
    ///
    /// Used when writing the file back, so a one-off `SUPERDASH_*` variable
    /// is not persisted.
    pub fn from_file() -> Self {
        Self::from_file_config(Self::load_file_config())
    }

    pub(crate) fn from_file_config(file: FileConfig) -> Self {
        Self::resolve(file, |_| None)
    }

    /// Merge a parsed file with environment lookups
    pub(crate) fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        // Theme: env > file > default
        let theme = env("SUPERDASH_THEME")
            .or(file.theme)
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_THEME.to_string());

        // Tick: file > default, clamped
        let tick_ms = file.tick_ms.unwrap_or(DEFAULT_TICK_MS).max(MIN_TICK_MS);

        let bootstrap = BootstrapConfig::from_file(file.bootstrap);

        // Click handling: env > file > default
        let disable_click = env("SUPERDASH_DISABLE_CLICK")
            .map(|v| env_flag(&v))
            .or(file.popover.and_then(|p| p.disable_click))
            .unwrap_or(false);

        let mut logging = LoggingConfig::from_file(file.logging);
        if let Some(level) = env("SUPERDASH_LOG_LEVEL") {
            logging.level = level;
        }

        Self {
            theme,
            tick_ms,
            bootstrap,
            popover: PopoverConfig { disable_click },
            logging,
        }
    }
}
