use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_yaml::Mapping;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{document, projection};
use crate::domain::errors::ValidationErrors;
use crate::domain::models::config::Configuration;

/// Environment prefix used by the CLI for overrides, e.g.
/// `AGROSENSE_DRONE__DEFAULT_ALTITUDE=40`.
pub const DEFAULT_ENV_PREFIX: &str = "AGROSENSE_";

/// Upper bound on how long reading the document may take.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration from {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Invalid configuration in {origin}: {errors}")]
    Invalid {
        origin: String,
        errors: ValidationErrors,
    },

    #[error("Configuration has not been loaded")]
    NotLoaded,
}

impl ConfigError {
    /// The collected validation issues, if this is a validation failure.
    pub const fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

/// Loads a configuration document and validates it in full.
///
/// Pipeline: read (bounded by a timeout) -> parse into an untyped tree ->
/// optional environment overrides -> projection into typed sections. I/O and
/// parse failures stop the pipeline; validation reports every issue at once.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: Option<String>,
    read_timeout: Duration,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            env_prefix: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable `<prefix><SECTION>__<KEY>` environment overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<Configuration, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        let text = document::read_with_timeout(path, self.read_timeout)?;
        self.load_document(&text, &path.display().to_string())
    }

    /// Load configuration from document text already in memory.
    pub fn load_from_str(&self, text: &str) -> Result<Configuration, ConfigError> {
        self.load_document(text, "<string>")
    }

    fn load_document(&self, text: &str, origin: &str) -> Result<Configuration, ConfigError> {
        let mut root = document::parse(text, origin)?;
        if let Some(prefix) = &self.env_prefix {
            root = document::apply_env_overrides(root, prefix, origin)?;
        }

        let config = Self::validate(&root).map_err(|errors| {
            warn!(origin, issues = errors.len(), "configuration rejected");
            for issue in &errors {
                debug!(origin, path = issue.path(), kind = issue.kind(), "{issue}");
            }
            ConfigError::Invalid {
                origin: origin.to_string(),
                errors,
            }
        })?;

        for warning in config.consistency_warnings() {
            warn!(origin, "{warning}");
        }
        info!(origin, "configuration loaded");
        Ok(config)
    }

    /// Validate a parsed document root and build the typed configuration.
    pub fn validate(root: &Mapping) -> Result<Configuration, ValidationErrors> {
        let projection = projection::project(root);
        for key in &projection.unknown_keys {
            warn!(key = %key, "ignoring unknown configuration key");
        }
        projection.result
    }
}

/// Load and validate `path` without environment overrides.
pub fn load(path: impl AsRef<Path>) -> Result<Configuration, ConfigError> {
    ConfigLoader::new().load_from_file(path)
}
