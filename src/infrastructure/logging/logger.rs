use super::config::{LogConfig, LogFormat, RotationPolicy};
use anyhow::{Context, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const LOG_FILE_NAME: &str = "agrosense.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logger implementation using tracing
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Initialize the global subscriber with the given configuration
    ///
    /// `RUST_LOG` directives take precedence over `config.level`. The
    /// returned value must be kept alive for file output to be flushed.
    ///
    /// # Errors
    /// Returns an error if the level is invalid, the log directory cannot be
    /// created, or a global subscriber is already installed
    pub fn init(config: &LogConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let make_filter = || {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(default_level).into())
                .from_env_lossy()
        };

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if let Some(ref log_dir) = config.log_dir {
            std::fs::create_dir_all(log_dir)
                .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

            let file_appender = match config.rotation {
                RotationPolicy::Daily => rolling::daily(log_dir, LOG_FILE_NAME),
                RotationPolicy::Hourly => rolling::hourly(log_dir, LOG_FILE_NAME),
                RotationPolicy::Never => rolling::never(log_dir, LOG_FILE_NAME),
            };
            let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(file_guard);

            // File layer - always JSON for structured logging
            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking_file)
                    .with_ansi(false)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(make_filter())
                    .boxed(),
            );
        }

        if config.enable_stderr {
            let stderr_layer = match config.format {
                LogFormat::Json => tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_current_span(true)
                    .with_target(true)
                    .with_filter(make_filter())
                    .boxed(),
                LogFormat::Pretty => tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(make_filter())
                    .boxed(),
            };
            layers.push(stderr_layer);
        }

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .context("Failed to install global tracing subscriber")?;

        tracing::debug!(
            level = %config.level,
            format = ?config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }
}

/// Parse log level string to Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("trace"), Ok(Level::TRACE)));
        assert!(matches!(parse_log_level("debug"), Ok(Level::DEBUG)));
        assert!(matches!(parse_log_level("info"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("warn"), Ok(Level::WARN)));
        assert!(matches!(parse_log_level("error"), Ok(Level::ERROR)));
        assert!(matches!(parse_log_level("WARN"), Ok(Level::WARN)));
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_invalid_level_fails_before_install() {
        let config = LogConfig {
            level: "loud".to_string(),
            ..LogConfig::default()
        };
        assert!(LoggerImpl::init(&config).is_err());
    }
}
