use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::events::time_unit::TimestampFallback;
use crate::export::{EVENT_LOG_FILE, SUMMARY_FILE};
use crate::report::REPORT_FILE;

/// Application configuration loaded from TOML config file.
/// All fields have defaults; the config file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Directory exports are written to (defaults to the current directory).
    pub output_dir: Option<PathBuf>,
    /// Session directory the pipeline writes `matchResult.json` into
    /// (overrides the XDG default).
    pub session_dir: Option<PathBuf>,
    /// Which timestamp fields feed the time-unit heuristic and display times.
    pub timestamp_fallback: TimestampFallback,
    pub export: ExportConfig,
    pub report: ReportConfig,
}

/// Export file names.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub event_log_file: String,
    pub summary_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            event_log_file: EVENT_LOG_FILE.to_string(),
            summary_file: SUMMARY_FILE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub file: String,
    /// Flate-compress PDF streams.
    pub compress: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            file: REPORT_FILE.to_string(),
            compress: true,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/courtside/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve the output directory: config value or the current directory.
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default session directory using the XDG data directory.
pub fn default_session_dir() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        dirs.data_dir().join("session")
    } else {
        // Fallback: current directory
        PathBuf::from(".courtside-session")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MATCH_EVENT_LOG_FILE;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.timestamp_fallback, TimestampFallback::T0);
        assert_eq!(config.export.event_log_file, EVENT_LOG_FILE);
        assert_eq!(config.export.summary_file, SUMMARY_FILE);
        assert_eq!(config.report.file, REPORT_FILE);
        assert!(config.report.compress);
        assert_eq!(config.resolve_output_dir(), PathBuf::from("."));
    }

    #[test]
    fn parses_overrides() {
        let config = AppConfig::parse(
            r#"
            output_dir = "/tmp/exports"
            timestamp_fallback = "t0_then_t1"

            [export]
            event_log_file = "match_event_logs.csv"

            [report]
            compress = false
            "#,
        )
        .unwrap();
        assert_eq!(config.timestamp_fallback, TimestampFallback::T0ThenT1);
        assert_eq!(config.export.event_log_file, MATCH_EVENT_LOG_FILE);
        assert_eq!(config.export.summary_file, SUMMARY_FILE);
        assert!(!config.report.compress);
        assert_eq!(config.resolve_output_dir(), PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn bad_fallback_is_parse_error() {
        assert!(AppConfig::parse(r#"timestamp_fallback = "t2""#).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[report]\nfile = \"out.pdf\"\n").unwrap();
        let config = AppConfig::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.report.file, "out.pdf");
    }
}
