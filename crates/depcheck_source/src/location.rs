//! Human-readable file locations for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A file, optionally narrowed to a 1-indexed line.
///
/// Used to point diagnostics at an include directive, a snapshot record, or a
/// whole file such as a configured directory or an object artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// The filesystem path.
    pub file_path: PathBuf,
    /// The line number (1-indexed), if known.
    pub line: Option<u32>,
}

impl Location {
    /// A location covering a whole file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
            line: None,
        }
    }

    /// A location at a specific line.
    pub fn line(path: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file_path: path.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file_path.display(), line),
            None => write!(f, "{}", self.file_path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_line() {
        let loc = Location::line("src/main.c", 10);
        assert_eq!(format!("{loc}"), "src/main.c:10");
    }

    #[test]
    fn display_whole_file() {
        let loc = Location::file("build/debug/main.o");
        assert_eq!(format!("{loc}"), "build/debug/main.o");
    }

    #[test]
    fn equality_with_different_values() {
        let a = Location::line("a.c", 1);
        let b = Location::line("b.c", 1);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
