//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Level derived from the `system` configuration section
//! - JSON or pretty formatting
//! - Optional rolling log files
pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
