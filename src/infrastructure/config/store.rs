//! Shared, hot-swappable configuration snapshot.
//!
//! Readers call [`ConfigStore::snapshot`] and keep the returned `Arc` for as
//! long as they need a consistent view. A reload builds a complete new
//! [`Configuration`] and swaps the pointer; a failed reload leaves the
//! previous snapshot in place.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tracing::{error, info, warn};

use super::loader::{ConfigError, ConfigLoader};
use crate::domain::models::config::Configuration;

/// Lifecycle of a [`ConfigStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StoreState {
    Unloaded,
    Loading,
    Loaded,
    /// The last load attempt failed. Any earlier snapshot is still served.
    Failed { error: String },
}

/// Owns the current configuration and reloads it from a fixed path.
pub struct ConfigStore {
    path: PathBuf,
    loader: ConfigLoader,
    current: ArcSwapOption<Configuration>,
    state: Mutex<StoreState>,
    reload_lock: Mutex<()>,
    generation: AtomicU64,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("state", &self.state())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConfigStore {
    /// Create an unloaded store. Nothing is read until [`Self::reload`].
    pub fn new(path: impl Into<PathBuf>, loader: ConfigLoader) -> Self {
        Self {
            path: path.into(),
            loader,
            current: ArcSwapOption::empty(),
            state: Mutex::new(StoreState::Unloaded),
            reload_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a store and perform the initial load.
    ///
    /// Fails if the initial load fails, so a process holding a store always
    /// has a configuration to serve.
    pub fn open(path: impl Into<PathBuf>, loader: ConfigLoader) -> Result<Self, ConfigError> {
        let store = Self::new(path, loader);
        store.reload()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> StoreState {
        lock(&self.state).clone()
    }

    /// Number of successful loads so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The current snapshot, if any load has ever succeeded.
    pub fn current(&self) -> Option<Arc<Configuration>> {
        self.current.load_full()
    }

    /// The current snapshot, or [`ConfigError::NotLoaded`].
    pub fn snapshot(&self) -> Result<Arc<Configuration>, ConfigError> {
        self.current().ok_or(ConfigError::NotLoaded)
    }

    /// Load the file again and swap in the result.
    ///
    /// On failure the previous snapshot (if any) keeps being served and the
    /// state becomes [`StoreState::Failed`].
    pub fn reload(&self) -> Result<Arc<Configuration>, ConfigError> {
        let _serialized = lock(&self.reload_lock);
        *lock(&self.state) = StoreState::Loading;

        match self.loader.load_from_file(&self.path) {
            Ok(config) => {
                let config = Arc::new(config);
                self.current.store(Some(Arc::clone(&config)));
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                *lock(&self.state) = StoreState::Loaded;
                info!(path = %self.path.display(), generation, "configuration active");
                Ok(config)
            }
            Err(err) => {
                *lock(&self.state) = StoreState::Failed {
                    error: err.to_string(),
                };
                if self.current.load().is_some() {
                    warn!(
                        path = %self.path.display(),
                        error = %err,
                        "reload failed, keeping previous configuration"
                    );
                } else {
                    error!(path = %self.path.display(), error = %err, "initial configuration load failed");
                }
                Err(err)
            }
        }
    }
}
