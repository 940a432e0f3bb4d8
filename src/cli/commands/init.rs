//! Implementation of the `agrosense init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use super::DEFAULT_CONFIG_PATH;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Configuration;

const HEADER: &str = "\
# AgroSense configuration
#
# Every section is required. Values can be overridden per process with
# AGROSENSE_<SECTION>__<KEY>=value, e.g. AGROSENSE_DRONE__DEFAULT_ALTITUDE=40.
";

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_path: PathBuf,
    pub directories_created: Vec<String>,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {dir}"));
            }
        }
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };
    let config_path = target_path.join(DEFAULT_CONFIG_PATH);

    if config_path.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: format!(
                "{} already exists. Use --force to overwrite.",
                config_path.display()
            ),
            config_path,
            directories_created: vec![],
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    let defaults = Configuration::default();
    let mut directories_created = vec![];
    let mut dirs = vec![];
    if let Some(parent) = config_path.parent() {
        dirs.push(parent.to_path_buf());
    }
    dirs.push(target_path.join(&defaults.system().data_directory));
    dirs.push(target_path.join(&defaults.system().models_directory));

    for dir in &dirs {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let relative = dir
                .strip_prefix(&target_path)
                .unwrap_or(dir)
                .to_string_lossy()
                .to_string();
            directories_created.push(relative);
        }
    }

    let yaml = defaults
        .to_yaml()
        .context("Failed to render default configuration")?;
    fs::write(&config_path, format!("{HEADER}{yaml}"))
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let output_data = InitOutput {
        success: true,
        message: format!("Wrote default configuration to {}", config_path.display()),
        config_path,
        directories_created,
    };
    output(&output_data, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::load;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_loadable_config() {
        let dir = TempDir::new().unwrap();
        let args = InitArgs {
            force: false,
            path: dir.path().to_path_buf(),
        };
        execute(args, true).await.unwrap();

        let config_path = dir.path().join(DEFAULT_CONFIG_PATH);
        let config = load(&config_path).unwrap();
        assert_eq!(config, Configuration::default());
        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("models").is_dir());
    }

    #[tokio::test]
    async fn test_init_does_not_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(DEFAULT_CONFIG_PATH);
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(&config_path, "custom: true\n").unwrap();

        let args = InitArgs {
            force: false,
            path: dir.path().to_path_buf(),
        };
        execute(args, true).await.unwrap();
        assert_eq!(std::fs::read_to_string(&config_path).unwrap(), "custom: true\n");

        let args = InitArgs {
            force: true,
            path: dir.path().to_path_buf(),
        };
        execute(args, true).await.unwrap();
        assert!(load(&config_path).is_ok());
    }
}
