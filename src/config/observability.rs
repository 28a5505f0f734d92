//! `[logging]` section: verbosity and the optional rolling JSON log file

use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_LOG_PREFIX: &str = "superdash";

/// How often the JSON log file rolls over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl LogRotation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

impl From<&str> for LogRotation {
    /// Anything unrecognised rolls daily
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hourly" => Self::Hourly,
            "never" => Self::Never,
            _ => Self::Daily,
        }
    }
}

/// Resolved `[logging]` settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive, either a bare level or `target=level` pairs
    pub level: String,
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_rotation: LogRotation,
    /// File name stem; the appender adds the date suffix
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            file_enabled: false,
            file_dir: PathBuf::from(DEFAULT_LOG_DIR),
            file_rotation: LogRotation::default(),
            file_prefix: DEFAULT_LOG_PREFIX.to_string(),
        }
    }
}

/// The `[logging]` table as written, every key optional
#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    /// Fill in whatever the table leaves out
    pub fn from_file(file: Option<FileLogging>) -> Self {
        let FileLogging {
            level,
            file_enabled,
            file_dir,
            file_rotation,
            file_prefix,
        } = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            level: level.unwrap_or(defaults.level),
            file_enabled: file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file_dir.map(PathBuf::from).unwrap_or(defaults.file_dir),
            file_rotation: file_rotation
                .as_deref()
                .map(LogRotation::from)
                .unwrap_or(defaults.file_rotation),
            file_prefix: file_prefix.unwrap_or(defaults.file_prefix),
        }
    }

    /// Whether any directive enables debug or trace output
    pub fn is_verbose(&self) -> bool {
        self.level.split(',').any(|directive| {
            let level = directive.rsplit('=').next().unwrap_or_default();
            matches!(
                level.trim().to_ascii_lowercase().as_str(),
                "debug" | "trace"
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_level(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            ..LoggingConfig::default()
        }
    }

    #[test]
    fn verbosity_follows_level() {
        assert!(!with_level("info").is_verbose());
        assert!(!with_level("warn,hyper=error").is_verbose());
        assert!(with_level("DEBUG").is_verbose());
        assert!(with_level("info,superdash=trace").is_verbose());
    }

    #[test]
    fn rotation_is_case_insensitive() {
        assert_eq!(LogRotation::from(" Hourly "), LogRotation::Hourly);
        assert_eq!(LogRotation::from("NEVER"), LogRotation::Never);
        assert_eq!(LogRotation::from("weekly"), LogRotation::Daily);
    }
}
