//! Domain layer for the agrosense configuration core
//!
//! Typed configuration sections, soil threshold logic and the validation
//! issue taxonomy. Nothing here performs I/O.

pub mod errors;
pub mod models;

pub use errors::{NumericRange, ValidationErrors, ValidationIssue};
