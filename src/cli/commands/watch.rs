//! Implementation of the `agrosense watch` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::ConfigArgs;
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::{spawn_reload_loop, watch_config, ConfigStore, StoreState};
use crate::infrastructure::logging::{LogConfig, LogFormat, LoggerImpl};

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Quiet period after a change before the file is reloaded, in milliseconds
    #[arg(long, default_value = "500")]
    pub debounce_ms: u64,

    /// Also write JSON logs under <data_directory>/logs
    #[arg(long)]
    pub log_to_file: bool,
}

#[derive(Debug, Serialize)]
pub struct WatchOutput {
    pub path: PathBuf,
    pub generation: u64,
    pub state: StoreState,
}

impl CommandOutput for WatchOutput {
    fn to_human(&self) -> String {
        let state = match &self.state {
            StoreState::Unloaded => "unloaded".to_string(),
            StoreState::Loading => "loading".to_string(),
            StoreState::Loaded => "loaded".to_string(),
            StoreState::Failed { error } => format!("last reload failed: {error}"),
        };
        format!(
            "Stopped watching {} after {} load(s); {state}",
            self.path.display(),
            self.generation
        )
    }
}

/// Load the configuration, start logging as it specifies, and reload on
/// every change until interrupted.
pub async fn execute(args: WatchArgs, json_mode: bool) -> Result<()> {
    let store = Arc::new(
        ConfigStore::open(&args.config.config, args.config.loader())
            .context("Initial configuration load failed")?,
    );
    let config = store.snapshot()?;

    let format = if json_mode { LogFormat::Json } else { LogFormat::Pretty };
    let _logger = LoggerImpl::init(&LogConfig::from_system(
        config.system(),
        format,
        args.log_to_file,
    ))?;
    tracing::info!(
        path = %store.path().display(),
        level = %config.system().effective_log_level(),
        "configuration loaded, watching for changes"
    );

    let events = watch_config(store.path())?;
    let reload_loop = spawn_reload_loop(
        Arc::clone(&store),
        events,
        Duration::from_millis(args.debounce_ms),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt")?;
    tracing::info!("interrupt received, stopping");
    reload_loop.abort();

    output(
        &WatchOutput {
            path: store.path().to_path_buf(),
            generation: store.generation(),
            state: store.state(),
        },
        json_mode,
    );
    Ok(())
}
