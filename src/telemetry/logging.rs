//! File and console logging setup.
//!
//! Installs a `tracing` subscriber with two layers: a daily-rolling file log
//! (plain or JSON) and an optional stderr console layer. Both are filtered
//! independently so the console can stay quiet while the file captures detail.

use crate::error::SwitchboardError;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Log file name prefix inside `log_dir`
pub const LOG_FILE_NAME: &str = "switchboard.log";

// Dependencies that are chatty at debug level
const NOISE_DIRECTIVES: &str = "rustyline=off,hyper=warn,h2=warn,reqwest=warn,tokio=warn,tower_http=info";

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Base directory for log files
    pub log_dir: PathBuf,
    /// Log level for file output
    pub file_log_level: String,
    /// Log level for console output (if enabled)
    pub console_log_level: String,
    /// Whether to enable console logging
    pub console_enabled: bool,
    /// Whether to write the file log as JSON lines
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            file_log_level: "info".to_string(),
            console_log_level: "error".to_string(),
            console_enabled: true,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create logging configuration from an arbitrary variable source
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(log_dir) = lookup("SWITCHBOARD_LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }
        if let Some(level) = lookup("SWITCHBOARD_FILE_LOG_LEVEL") {
            config.file_log_level = level;
        }
        if let Some(level) = lookup("SWITCHBOARD_CONSOLE_LOG_LEVEL") {
            config.console_log_level = level;
        }
        if let Some(enabled) = lookup("SWITCHBOARD_CONSOLE_LOGGING") {
            config.console_enabled = enabled.parse().unwrap_or(true);
        }
        if let Some(json) = lookup("SWITCHBOARD_JSON_LOGS") {
            config.json_format = json.parse().unwrap_or(false);
        }

        config
    }
}

/// Guard that must be kept alive for the duration of the application
/// to ensure proper log flushing
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

fn build_filter(level: &str, fallback: &str) -> EnvFilter {
    EnvFilter::try_new(format!("{},{}", level, NOISE_DIRECTIVES))
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{}", fallback, NOISE_DIRECTIVES)))
}

/// Initialize the logging system
pub fn init_logging(config: LoggingConfig) -> Result<LoggingGuard, SwitchboardError> {
    std::fs::create_dir_all(&config.log_dir).map_err(|e| {
        SwitchboardError::configuration_error(format!("Failed to create log directory: {}", e))
    })?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_NAME);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = build_filter(&config.file_log_level, "info");
    let file_layer = if config.json_format {
        fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_timer(ChronoUtc::new("%Y-%m-%d %H:%M:%S%.3f UTC".to_string()))
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .json()
            .with_current_span(true)
            .with_filter(file_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(ChronoUtc::new("%Y-%m-%d %H:%M:%S%.3f UTC".to_string()))
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_filter(file_filter)
            .boxed()
    };

    let console_layer = config.console_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_filter(build_filter(&config.console_log_level, "error"))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| {
            SwitchboardError::configuration_error(format!("Failed to install logger: {}", e))
        })?;

    info!(
        log_dir = %config.log_dir.display(),
        json_format = config.json_format,
        console = config.console_enabled,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.console_log_level, "error");
        assert!(config.console_enabled);
        assert!(!config.json_format);
    }

    #[test]
    fn test_from_vars() {
        let vars: HashMap<&str, &str> = [
            ("SWITCHBOARD_LOG_DIR", "/var/log/switchboard"),
            ("SWITCHBOARD_FILE_LOG_LEVEL", "debug"),
            ("SWITCHBOARD_CONSOLE_LOGGING", "false"),
            ("SWITCHBOARD_JSON_LOGS", "not-a-bool"),
        ]
        .into_iter()
        .collect();

        let config = LoggingConfig::from_vars(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/switchboard"));
        assert_eq!(config.file_log_level, "debug");
        assert!(!config.console_enabled);
        assert!(!config.json_format);
    }
}
