//! Error types for snapshot and graph operations.

use std::path::PathBuf;

/// Errors raised while reading or writing the snapshot.
///
/// Both are fatal to a run: the previous snapshot is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An I/O error occurred while reading or writing the snapshot.
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A snapshot line could not be parsed.
    #[error("{}:{line}: malformed snapshot: {reason}", .path.display())]
    SnapshotFormat {
        /// The snapshot file.
        path: PathBuf,
        /// 1-indexed line of the offending text.
        line: usize,
        /// Description of the problem.
        reason: String,
    },
}
