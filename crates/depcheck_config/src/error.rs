//! Configuration errors.

use std::path::PathBuf;

/// Why `depcheck.toml` could not be turned into a usable configuration.
///
/// All of these abort a run before the snapshot is touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file is absent or unreadable.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("invalid depcheck.toml: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required key is absent or empty.
    #[error("depcheck.toml is missing `{0}`")]
    MissingField(&'static str),

    /// Values that parse but cannot drive a run.
    #[error("invalid depcheck.toml: {0}")]
    Invalid(String),
}
