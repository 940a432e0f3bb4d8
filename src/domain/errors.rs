//! Validation issues raised while projecting a configuration document.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Closed or half-open numeric interval used for range checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    /// When set, `min` itself is outside the range.
    pub min_exclusive: bool,
}

impl NumericRange {
    pub const fn inclusive(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
        }
    }

    /// Strictly greater than zero.
    pub const fn positive() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
            min_exclusive: true,
        }
    }

    pub const fn percent() -> Self {
        Self::inclusive(0.0, 100.0)
    }

    pub const fn probability() -> Self {
        Self::inclusive(0.0, 1.0)
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_min = if self.min_exclusive {
            value > self.min
        } else {
            value >= self.min
        };
        value.is_finite() && above_min && value <= self.max
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.min_exclusive { '(' } else { '[' };
        if self.max.is_infinite() {
            write!(f, "{open}{}, inf)", self.min)
        } else {
            write!(f, "{open}{}, {}]", self.min, self.max)
        }
    }
}

/// A single problem found in a configuration document.
///
/// Paths are dotted from the document root, e.g.
/// `soil_sensors.thresholds.moisture` or
/// `image_processing.vegetation_detection.hsv_green_lower[1]`.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("{path}: required field is missing")]
    MissingField { path: String },

    #[error("{path}: expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{path}: value {value} is outside {range}")]
    RangeViolation {
        path: String,
        value: f64,
        range: NumericRange,
    },

    #[error("{path}: '{value}' is not one of: {}", .allowed.join(", "))]
    InvalidEnum {
        path: String,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("{path}: {detail}")]
    OrderingViolation { path: String, detail: String },

    #[error("{path}: duplicate value '{value}'")]
    DuplicateValue { path: String, value: String },

    #[error("{path}: must not be empty")]
    EmptyValue { path: String },

    #[error("{path}: '{value}' is not a valid {expected}")]
    InvalidFormat {
        path: String,
        value: String,
        expected: &'static str,
    },
}

impl ValidationIssue {
    pub fn path(&self) -> &str {
        match self {
            Self::MissingField { path }
            | Self::TypeMismatch { path, .. }
            | Self::RangeViolation { path, .. }
            | Self::InvalidEnum { path, .. }
            | Self::OrderingViolation { path, .. }
            | Self::DuplicateValue { path, .. }
            | Self::EmptyValue { path }
            | Self::InvalidFormat { path, .. } => path,
        }
    }

    /// Short machine-readable name of the issue kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::RangeViolation { .. } => "range_violation",
            Self::InvalidEnum { .. } => "invalid_enum",
            Self::OrderingViolation { .. } => "ordering_violation",
            Self::DuplicateValue { .. } => "duplicate_value",
            Self::EmptyValue { .. } => "empty_value",
            Self::InvalidFormat { .. } => "invalid_format",
        }
    }
}

/// Every issue found during one load attempt, in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationIssue>);

impl ValidationErrors {
    pub(crate) fn new(issues: Vec<ValidationIssue>) -> Self {
        debug_assert!(!issues.is_empty());
        Self(issues)
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationIssue> {
        self.0.iter()
    }

    /// Issues reported at exactly `path`.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
        self.0.iter().filter(move |issue| issue.path() == path)
    }

    pub fn into_inner(self) -> Vec<ValidationIssue> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} configuration issue(s)", self.0.len())?;
        for issue in &self.0 {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_contains() {
        let p = NumericRange::probability();
        assert!(p.contains(0.0));
        assert!(p.contains(1.0));
        assert!(!p.contains(1.01));
        assert!(!p.contains(f64::NAN));

        let positive = NumericRange::positive();
        assert!(!positive.contains(0.0));
        assert!(positive.contains(0.001));
        assert!(positive.contains(1e12));
        assert!(!positive.contains(f64::INFINITY));
    }

    #[test]
    fn test_range_display() {
        assert_eq!(NumericRange::percent().to_string(), "[0, 100]");
        assert_eq!(NumericRange::positive().to_string(), "(0, inf)");
    }

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::InvalidEnum {
            path: "drone.camera.format".to_string(),
            value: "gif".to_string(),
            allowed: &["jpg", "png"],
        };
        assert_eq!(
            issue.to_string(),
            "drone.camera.format: 'gif' is not one of: jpg, png"
        );
        assert_eq!(issue.kind(), "invalid_enum");
    }

    #[test]
    fn test_errors_display_lists_every_issue() {
        let errors = ValidationErrors::new(vec![
            ValidationIssue::MissingField {
                path: "drone".to_string(),
            },
            ValidationIssue::EmptyValue {
                path: "firebase.project_id".to_string(),
            },
        ]);
        let text = errors.to_string();
        assert!(text.starts_with("2 configuration issue(s)"));
        assert!(text.contains("drone: required field is missing"));
        assert!(text.contains("firebase.project_id: must not be empty"));
        assert_eq!(errors.at("drone").count(), 1);
    }
}
