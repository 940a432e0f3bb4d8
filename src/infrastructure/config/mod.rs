//! Configuration management infrastructure
//!
//! Loading happens in three independent phases:
//! - Document reading and YAML parsing into an untyped tree (`document`)
//! - Optional figment environment overrides
//! - Projection into typed sections with exhaustive validation (`projection`)
//!
//! `store` keeps the active configuration behind an atomically swapped `Arc`
//! and `watcher` reloads it when the file changes.

mod document;
pub mod loader;
pub mod projection;
pub mod store;
pub mod watcher;

pub use loader::{load, ConfigError, ConfigLoader, DEFAULT_ENV_PREFIX, DEFAULT_READ_TIMEOUT};
pub use store::{ConfigStore, StoreState};
pub use watcher::{spawn_reload_loop, watch_config, ConfigReloadEvent, WatchError};
