//! Source file representation with its content hash.

use depcheck_common::ContentHash;
use std::io;
use std::path::{Path, PathBuf};

use crate::include::{parse_include_line, IncludeDirective};

/// A C/C++ source or header file read from disk.
///
/// Content is decoded lossily: include scanning only cares about ASCII
/// directives, and the hash is taken over the raw bytes.
pub struct SourceFile {
    /// The filesystem path of this file.
    pub path: PathBuf,
    /// The decoded text content of the file.
    pub content: String,
    /// Hash of the raw file bytes, compared against the mirror copy.
    pub content_hash: ContentHash,
}

impl SourceFile {
    /// Reads a file from disk.
    pub fn load(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(path.to_path_buf(), &bytes))
    }

    /// Builds a `SourceFile` from in-memory bytes (useful for tests).
    pub fn from_bytes(path: PathBuf, bytes: &[u8]) -> Self {
        Self {
            path,
            content: String::from_utf8_lossy(bytes).into_owned(),
            content_hash: ContentHash::from_bytes(bytes),
        }
    }

    /// Returns every `#include` directive in file order.
    pub fn includes(&self) -> Vec<IncludeDirective> {
        self.content
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| {
                parse_include_line(line).map(|(target, kind)| IncludeDirective {
                    target,
                    kind,
                    line: (idx as u32) + 1,
                })
            })
            .collect()
    }
}
