//! Parsing and validation of `depcheck.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`DepcheckConfig`], then resolves its relative paths against the project
//! directory into a [`ResolvedConfig`] the checker can use directly.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::{resolve_config, ResolvedConfig, UnresolvedPath};
pub use types::*;
