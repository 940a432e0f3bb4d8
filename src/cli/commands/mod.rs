//! CLI command implementations.

pub mod init;
pub mod show;
pub mod soil;
pub mod validate;
pub mod watch;

use std::path::PathBuf;

use clap::Args;

use crate::domain::models::Configuration;
use crate::infrastructure::config::{ConfigError, ConfigLoader, DEFAULT_ENV_PREFIX};

/// Location of the configuration file relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Arguments shared by every command that reads a configuration file.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Ignore AGROSENSE_<SECTION>__<KEY> environment overrides
    #[arg(long)]
    pub no_env: bool,
}

impl ConfigArgs {
    pub fn loader(&self) -> ConfigLoader {
        if self.no_env {
            ConfigLoader::new()
        } else {
            ConfigLoader::new().with_env_prefix(DEFAULT_ENV_PREFIX)
        }
    }

    pub fn load(&self) -> Result<Configuration, ConfigError> {
        self.loader().load_from_file(&self.config)
    }
}
