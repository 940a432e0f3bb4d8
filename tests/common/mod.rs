//! Common test utilities for integration tests
//!
//! Provides the example configuration document and helpers to mutate it
//! one key at a time.

#![allow(dead_code)]

use std::path::PathBuf;

use agrosense::{ConfigLoader, Configuration, ValidationErrors};
use serde_yaml::{Mapping, Value};
use tempfile::TempDir;

/// The shipped example configuration.
pub const EXAMPLE: &str = include_str!("../../config/config.yaml");

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write `contents` to `config.yaml` inside a fresh temporary directory.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, contents).expect("Failed to write config");
    (dir, path)
}

/// Parse the example document into a mutable tree.
pub fn example_tree() -> Mapping {
    serde_yaml::from_str(EXAMPLE).expect("example must parse")
}

/// Replace the value at a dotted `path`, creating nothing.
pub fn set(root: &mut Mapping, path: &str, value: impl Into<Value>) {
    let (parent, key) = split(path);
    parent_of(root, parent).insert(Value::from(key), value.into());
}

/// Remove the key at a dotted `path`.
pub fn remove(root: &mut Mapping, path: &str) {
    let (parent, key) = split(path);
    parent_of(root, parent).remove(key);
}

/// Validate a mutated tree.
pub fn validate(root: &Mapping) -> Result<Configuration, ValidationErrors> {
    ConfigLoader::validate(root)
}

/// Validate `root` and return its issues, panicking if it is accepted.
pub fn issues(root: &Mapping) -> ValidationErrors {
    match validate(root) {
        Ok(_) => panic!("expected the document to be rejected"),
        Err(errors) => errors,
    }
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn split(path: &str) -> (&str, &str) {
    path.rsplit_once('.').unwrap_or(("", path))
}

fn parent_of<'a>(root: &'a mut Mapping, path: &str) -> &'a mut Mapping {
    if path.is_empty() {
        return root;
    }
    path.split('.').fold(root, |map, key| {
        map.get_mut(key)
            .and_then(Value::as_mapping_mut)
            .unwrap_or_else(|| panic!("no mapping at {key} in {path}"))
    })
}
