//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use super::commands::{init::InitArgs, show::ShowArgs, soil::SoilArgs, validate::ValidateArgs, watch::WatchArgs};
use crate::infrastructure::logging::{LogConfig, LogFormat};

#[derive(Parser, Debug)]
#[command(name = "agrosense")]
#[command(about = "AgroSense - agricultural robot configuration tool", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Verbosity of diagnostics written to stderr
    #[arg(
        long,
        global = true,
        default_value = "warn",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,
}

impl Cli {
    /// Logger settings for one-shot commands: stderr only, no files.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            format: if self.json { LogFormat::Json } else { LogFormat::Pretty },
            log_dir: None,
            enable_stderr: true,
            ..LogConfig::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init(InitArgs),

    /// Load a configuration file and report every problem in it
    Validate(ValidateArgs),

    /// Print the effective configuration, or one section of it
    Show(ShowArgs),

    /// Classify soil readings against the configured thresholds
    Soil(SoilArgs),

    /// Keep the configuration loaded and reload it when the file changes
    Watch(WatchArgs),
}
