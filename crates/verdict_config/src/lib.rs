//! Parsing and validation of `verdict.toml` builder configuration.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`BuilderConfig`] controlling batch sizes, the dependency-cycle policy and
//! the full-build fallback.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
