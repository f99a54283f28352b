//! Diagnostic codes with category prefixes for structured identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
    /// Informational diagnostics, prefixed with `I`.
    Info,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Info => 'I',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g. `E101`, `W102`, `I101`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// The previous dependency snapshot is malformed.
    pub const SNAPSHOT_FORMAT: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
    /// A stale object file could not be deleted.
    pub const OBJECT_DELETE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);
    /// The mirror copy of a changed source could not be refreshed.
    pub const MIRROR_WRITE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Error, 103);

    /// A configured directory does not exist or is not a directory.
    pub const UNRESOLVED_CONFIG_PATH: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);
    /// A source file could not be read and is treated as missing.
    pub const UNREADABLE_SOURCE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);
    /// Two files include each other, directly or through other headers.
    pub const INCLUDE_CYCLE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 103);
    /// An include target was not found in any search directory.
    pub const UNRESOLVED_INCLUDE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 104);

    /// A stale object file was deleted.
    pub const OBJECT_DELETED: DiagnosticCode = DiagnosticCode::new(Category::Info, 101);
    /// A stale object file was absent; the source must be compiled.
    pub const OBJECT_MISSING: DiagnosticCode = DiagnosticCode::new(Category::Info, 102);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
