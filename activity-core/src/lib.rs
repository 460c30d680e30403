//! Core shared library for the activity timeline.
//!
//! This crate exposes the primitives every other crate in the workspace
//! depends on: the canonical error type, configuration loading, the
//! Postgres pool wrapper, JSON helpers and logging setup.

pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::{CoreConfig, Environment};
pub use errors::{ConfigError, Result as CoreResult, TimelineError};
