//! Infrastructure layer module
//!
//! This module contains the I/O-facing parts of the crate:
//! - Configuration loading, validation, shared snapshots and hot reload
//! - Logging infrastructure

pub mod config;
pub mod logging;
