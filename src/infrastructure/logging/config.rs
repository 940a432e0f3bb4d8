use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::models::config::{LogLevel, SystemSettings};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Directory for log files (optional, if None logs only to stderr)
    pub log_dir: Option<PathBuf>,

    /// Enable stderr logging
    #[serde(default = "default_true")]
    pub enable_stderr: bool,

    /// Log rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            log_dir: None,
            enable_stderr: true,
            rotation: RotationPolicy::default(),
        }
    }
}

impl LogConfig {
    /// Derive logging from the `system` section: `debug_mode` forces debug,
    /// files go to `<data_directory>/logs` when `log_to_file` is set.
    pub fn from_system(system: &SystemSettings, format: LogFormat, log_to_file: bool) -> Self {
        Self {
            level: level_name(system.effective_log_level()).to_string(),
            format,
            log_dir: log_to_file.then(|| system.data_directory.join("logs")),
            enable_stderr: true,
            rotation: RotationPolicy::Daily,
        }
    }
}

/// Tracing directive name for a configured level.
pub const fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_format() -> LogFormat {
    LogFormat::Pretty
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_system_uses_configured_level() {
        let mut system = SystemSettings {
            log_level: LogLevel::Warn,
            ..SystemSettings::default()
        };
        let config = LogConfig::from_system(&system, LogFormat::Json, false);
        assert_eq!(config.level, "warn");
        assert!(config.log_dir.is_none());

        system.debug_mode = true;
        let config = LogConfig::from_system(&system, LogFormat::Json, true);
        assert_eq!(config.level, "debug");
        assert_eq!(config.log_dir, Some(PathBuf::from("data/logs")));
    }
}
