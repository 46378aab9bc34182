//! Parsing and validation of `kiln.toml` configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`KilnConfig`] controlling change-detection limits, input normalization, and
//! cache artifact compression.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use types::*;
