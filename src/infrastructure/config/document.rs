//! Reading and parsing the raw configuration document.
//!
//! Produces the untyped `serde_yaml::Value` tree that
//! [`super::projection`] turns into typed sections.

use std::io;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use figment::providers::Env;
use figment::Figment;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::loader::ConfigError;

/// Read a UTF-8 file, giving up after `timeout`.
///
/// The read runs on a helper thread; a read that stalls past `timeout`
/// fails with `ErrorKind::TimedOut` and the thread is left to finish alone.
pub(crate) fn read_with_timeout(path: &Path, timeout: Duration) -> Result<String, ConfigError> {
    let io_error = |source: io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    let (tx, rx) = mpsc::channel();
    let owned = path.to_path_buf();
    thread::Builder::new()
        .name("config-read".to_string())
        .spawn(move || {
            let _ = tx.send(std::fs::read_to_string(owned));
        })
        .map_err(io_error)?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map_err(io_error),
        Err(RecvTimeoutError::Timeout) => Err(io_error(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("read did not complete within {timeout:?}"),
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(io_error(io::Error::other(
            "reader thread exited without a result",
        ))),
    }
}

/// Parse document text into a root mapping.
///
/// An empty document is an empty mapping, so every section is then reported
/// as missing. A non-mapping root cannot be validated and is a parse error.
pub(crate) fn parse(text: &str, origin: &str) -> Result<Mapping, ConfigError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;

    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(ConfigError::Parse {
            origin: origin.to_string(),
            message: format!(
                "document root must be a mapping of sections, found {}",
                match other {
                    Value::Sequence(_) => "a sequence",
                    Value::Tagged(_) => "a tagged value",
                    _ => "a scalar",
                }
            ),
        }),
    }
}

/// Layer `<PREFIX><SECTION>__<KEY>=value` environment variables over the
/// document. `__` separates nesting levels.
///
/// Only the variables go through figment; the result is merged into the
/// parsed tree so the document keeps every shape YAML allows.
pub(crate) fn apply_env_overrides(
    mut root: Mapping,
    prefix: &str,
    origin: &str,
) -> Result<Mapping, ConfigError> {
    let overridden: Vec<String> = std::env::vars()
        .map(|(key, _)| key)
        .filter(|key| key.starts_with(prefix))
        .collect();
    if overridden.is_empty() {
        return Ok(root);
    }
    for key in &overridden {
        debug!(variable = %key, "applying environment override");
    }

    let overlay: Mapping = Figment::from(Env::prefixed(prefix).split("__"))
        .extract()
        .map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            message: format!("failed to read {prefix}* environment overrides: {e}"),
        })?;
    merge(&mut root, overlay);
    Ok(root)
}

/// Deep-merge `overlay` into `base`. Nested mappings merge key by key,
/// anything else replaces the base value.
fn merge(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        let Value::Mapping(nested) = value else {
            base.insert(key, value);
            continue;
        };
        if let Some(Value::Mapping(existing)) = base.get_mut(&key) {
            merge(existing, nested);
            continue;
        }
        base.insert(key, Value::Mapping(nested));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_existing_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "system: {{}}").unwrap();
        file.flush().unwrap();

        let text = read_with_timeout(file.path(), Duration::from_secs(5)).unwrap();
        assert_eq!(text, "system: {}");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read_with_timeout(Path::new("/nonexistent/agrosense.yaml"), Duration::from_secs(5))
            .unwrap_err();
        match err {
            ConfigError::Io { source, .. } => assert_eq!(source.kind(), io::ErrorKind::NotFound),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse("", "test").unwrap().is_empty());
        assert!(parse("# only a comment\n", "test").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_mapping_root() {
        let err = parse("- a\n- b\n", "test").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref message, .. } if message.contains("sequence")));
    }

    #[test]
    fn test_parse_reports_syntax_error() {
        let err = parse("drone:\n  camera: [1, 2\n", "test").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_override_replaces_nested_value() {
        let root = parse("drone:\n  default_altitude: 30\n  survey_speed: 5\n", "test").unwrap();

        temp_env::with_var("AGROTEST_DRONE__DEFAULT_ALTITUDE", Some("45"), || {
            let merged = apply_env_overrides(root.clone(), "AGROTEST_", "test").unwrap();
            let drone = merged.get("drone").and_then(Value::as_mapping).unwrap();
            assert_eq!(drone.get("default_altitude").and_then(Value::as_u64), Some(45));
            assert_eq!(drone.get("survey_speed").and_then(Value::as_u64), Some(5));
        });
    }

    #[test]
    fn test_no_matching_env_leaves_document_untouched() {
        let root = parse("system:\n  debug_mode: false\n", "test").unwrap();
        let merged = apply_env_overrides(root.clone(), "AGROTEST_UNUSED_PREFIX_", "test").unwrap();
        assert_eq!(merged, root);
    }

    #[test]
    fn test_env_override_adds_missing_nested_key() {
        let root = parse("drone:\n  survey_speed: 5\n", "test").unwrap();

        temp_env::with_var("AGROTEST3_DRONE__CAMERA__QUALITY", Some("80"), || {
            let merged = apply_env_overrides(root.clone(), "AGROTEST3_", "test").unwrap();
            let drone = merged.get("drone").and_then(Value::as_mapping).unwrap();
            assert_eq!(drone.get("survey_speed").and_then(Value::as_u64), Some(5));
            let camera = drone.get("camera").and_then(Value::as_mapping).unwrap();
            assert_eq!(camera.get("quality").and_then(Value::as_u64), Some(80));
        });
    }

    #[test]
    fn test_env_override_keeps_non_string_keys_in_document() {
        let root = parse("system:\n  debug_mode: false\nextra:\n  1: one\n", "test").unwrap();

        temp_env::with_var("AGROTEST4_UNRELATED", Some("1"), || {
            let merged = apply_env_overrides(root.clone(), "AGROTEST4_", "test").unwrap();
            let extra = merged.get("extra").and_then(Value::as_mapping).unwrap();
            assert_eq!(extra.get(Value::from(1)).and_then(Value::as_str), Some("one"));
            assert!(merged.contains_key("unrelated"));
        });
    }
}
