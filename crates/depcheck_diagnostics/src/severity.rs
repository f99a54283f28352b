//! How loud a diagnostic is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic, `Note < Warning < Error`.
///
/// Notes report what a run did to the build tree, warnings report inputs that
/// were skipped, and errors report actions that failed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// An object was deleted or flagged for recompilation.
    Note,
    /// An input was tolerated but may hide a problem.
    Warning,
    /// An action on disk failed. Not fatal on its own.
    Error,
}

impl Severity {
    /// Lowercase name used in terminal output and JSON reports.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Whether the diagnostic is still printed under `--quiet`.
    pub fn survives_quiet(self) -> bool {
        self == Severity::Error
    }

    /// ANSI SGR parameters for the colored header.
    pub(crate) fn ansi_style(self) -> &'static str {
        match self {
            Severity::Note => "1;36",
            Severity::Warning => "1;33",
            Severity::Error => "1;31",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
