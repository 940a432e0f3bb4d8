//! Configuration hot reload.
//!
//! Watches the configuration file's directory and turns file system events
//! for that file into [`ConfigReloadEvent`]s. [`spawn_reload_loop`] feeds
//! those events into a [`ConfigStore`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::store::ConfigStore;

/// Configuration reload event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigReloadEvent {
    /// The watcher is installed.
    Ready,

    /// Configuration file was created or modified
    Changed(PathBuf),

    /// Configuration file was removed
    Removed(PathBuf),

    /// The underlying watcher reported an error
    Error { path: PathBuf, error: String },
}

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to watch {}: {source}", path.display())]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Start watching `config_path`.
///
/// Events arrive on the returned receiver until it is dropped, which also
/// stops the watcher.
pub fn watch_config(
    config_path: &Path,
) -> Result<mpsc::Receiver<ConfigReloadEvent>, WatchError> {
    if !config_path.is_file() {
        return Err(WatchError::NotFound(config_path.to_path_buf()));
    }
    let target = config_path.to_path_buf();
    let directory = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (fs_tx, mut fs_rx) = mpsc::channel(100);
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = fs_tx.blocking_send(res);
        },
        notify::Config::default(),
    )
    .map_err(|source| WatchError::Notify {
        path: target.clone(),
        source,
    })?;
    watcher
        .watch(&directory, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Notify {
            path: target.clone(),
            source,
        })?;
    info!(path = %target.display(), "watching configuration file");

    let (tx, rx) = mpsc::channel(100);
    tokio::spawn(async move {
        // The watcher lives as long as this task.
        let _watcher = watcher;
        let _ = tx.send(ConfigReloadEvent::Ready).await;

        loop {
            tokio::select! {
                () = tx.closed() => {
                    debug!(path = %target.display(), "receiver dropped, stopping watcher");
                    break;
                }
                event_result = fs_rx.recv() => {
                    let Some(event_result) = event_result else {
                        break;
                    };

                    let reload_event = match event_result {
                        Ok(event) => {
                            if !event.paths.iter().any(|p| p.file_name() == target.file_name()) {
                                continue;
                            }
                            match event.kind {
                                EventKind::Create(_) | EventKind::Modify(_) => {
                                    debug!(path = %target.display(), "configuration file changed");
                                    ConfigReloadEvent::Changed(target.clone())
                                }
                                EventKind::Remove(_) => {
                                    warn!(path = %target.display(), "configuration file removed");
                                    ConfigReloadEvent::Removed(target.clone())
                                }
                                _ => continue,
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "watch error");
                            ConfigReloadEvent::Error {
                                path: target.clone(),
                                error: e.to_string(),
                            }
                        }
                    };

                    if tx.send(reload_event).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    Ok(rx)
}

/// Reload `store` whenever a `Changed` event arrives.
///
/// Events arriving within `debounce` of a change are coalesced into one
/// reload. A failed reload keeps the previous configuration. The task ends
/// when the event channel closes.
pub fn spawn_reload_loop(
    store: Arc<ConfigStore>,
    mut events: mpsc::Receiver<ConfigReloadEvent>,
    debounce: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ConfigReloadEvent::Ready => debug!("configuration watcher ready"),
                ConfigReloadEvent::Changed(_) => {
                    tokio::time::sleep(debounce).await;
                    while let Ok(pending) = events.try_recv() {
                        debug!(?pending, "coalescing configuration event");
                    }

                    // reload() logs its own success or failure
                    let store = Arc::clone(&store);
                    if let Err(join_error) = tokio::task::spawn_blocking(move || store.reload()).await {
                        error!(error = %join_error, "reload task panicked");
                    }
                }
                ConfigReloadEvent::Removed(path) => {
                    warn!(path = %path.display(), "configuration file removed, keeping current configuration");
                }
                ConfigReloadEvent::Error { path, error } => {
                    error!(path = %path.display(), %error, "configuration watcher error");
                }
            }
        }
        debug!("configuration reload loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::loader::ConfigLoader;
    use std::fs;
    use tempfile::TempDir;

    const EXAMPLE: &str = include_str!("../../../config/config.yaml");

    #[tokio::test]
    async fn test_watch_missing_file() {
        let result = watch_config(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(WatchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_watch_emits_ready() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, EXAMPLE).unwrap();

        let mut rx = watch_config(&path).unwrap();
        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(ConfigReloadEvent::Ready));
    }

    #[tokio::test]
    async fn test_reload_loop_applies_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, EXAMPLE).unwrap();
        let store = Arc::new(ConfigStore::open(&path, ConfigLoader::new()).unwrap());

        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_reload_loop(Arc::clone(&store), rx, Duration::from_millis(10));

        fs::write(&path, EXAMPLE.replace("update_interval: 60", "update_interval: 30")).unwrap();
        tx.send(ConfigReloadEvent::Changed(path.clone())).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(store.generation(), 2);
        assert_eq!(store.snapshot().unwrap().mobile_app().update_interval, 30);
    }

    #[tokio::test]
    async fn test_reload_loop_keeps_config_on_bad_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, EXAMPLE).unwrap();
        let store = Arc::new(ConfigStore::open(&path, ConfigLoader::new()).unwrap());

        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_reload_loop(Arc::clone(&store), rx, Duration::from_millis(10));

        fs::write(&path, "not: [valid").unwrap();
        tx.send(ConfigReloadEvent::Changed(path.clone())).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(store.generation(), 1);
        assert_eq!(store.snapshot().unwrap().mobile_app().update_interval, 60);
    }
}
