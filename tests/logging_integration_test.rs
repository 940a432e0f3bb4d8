// Integration tests for logging functionality
// Note: the logger installs global state, so this file holds a single test.

use agrosense::infrastructure::logging::{LogConfig, LogFormat, LoggerImpl, RotationPolicy};
use agrosense::ConfigLoader;
use std::fs;
use tempfile::TempDir;
use tracing::{info, instrument};

#[test]
fn test_logging_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = temp_dir.path().join("logs");

    let config = LogConfig {
        level: "debug".to_string(),
        format: LogFormat::Json,
        log_dir: Some(log_dir.clone()),
        enable_stderr: false,
        rotation: RotationPolicy::Never,
    };

    let logger = LoggerImpl::init(&config).unwrap();

    // A second global subscriber is refused.
    assert!(LoggerImpl::init(&config).is_err());

    info!(key = "value", "Test message with fields");
    assert_eq!(instrumented_add(5, 7), 12);

    // Loader diagnostics flow through the same subscriber.
    let rejected = ConfigLoader::new().load_from_str("drone: {}\n");
    assert!(rejected.is_err());

    // Dropping the guard flushes the non-blocking writer.
    drop(logger);

    let contents = fs::read_to_string(log_dir.join("agrosense.log")).unwrap();
    assert!(contents.contains("Test message with fields"));
    assert!(contents.contains("entering instrumented function"));
    assert!(contents.contains("configuration rejected"));
    assert!(contents.lines().all(|line| line.starts_with('{')));
}

#[instrument]
fn instrumented_add(a: i32, b: i32) -> i32 {
    info!("entering instrumented function");
    a + b
}
