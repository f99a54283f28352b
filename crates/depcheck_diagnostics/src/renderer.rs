//! Diagnostic rendering backends.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// warning[W104]: include "config.h" not found
///   --> src/main.c:3
///    = note: searched 2 include paths
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, severity: Severity) -> String {
        if !self.color {
            return severity.to_string();
        }
        format!("\x1b[{}m{severity}\x1b[0m", severity.ansi_style())
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = format!(
            "{}[{}]: {}\n",
            self.header(diag.severity),
            diag.code,
            diag.message
        );

        if let Some(location) = &diag.location {
            out.push_str(&format!("  --> {location}\n"));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }

        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;
    use depcheck_source::Location;

    #[test]
    fn render_with_location() {
        let diag = Diagnostic::warning(
            DiagnosticCode::UNRESOLVED_INCLUDE,
            "include \"config.h\" not found",
        )
        .at(Location::line("src/main.c", 3));

        let output = TerminalRenderer::new(false).render(&diag);

        assert!(output.contains("warning[W104]: include \"config.h\" not found"));
        assert!(output.contains("--> src/main.c:3"));
    }

    #[test]
    fn render_with_notes_and_help() {
        let diag = Diagnostic::error(DiagnosticCode::OBJECT_DELETE_FAILED, "cannot delete main.o")
            .with_note("permission denied")
            .with_help("remove the file by hand before building");

        let output = TerminalRenderer::new(false).render(&diag);

        assert!(output.contains("error[E102]: cannot delete main.o"));
        assert!(output.contains("= note: permission denied"));
        assert!(output.contains("= help: remove the file by hand before building"));
        assert!(!output.contains("-->"));
    }

    #[test]
    fn render_colored_header() {
        let diag = Diagnostic::note(DiagnosticCode::OBJECT_DELETED, "deleted main.o");
        let output = TerminalRenderer::new(true).render(&diag);
        assert!(output.starts_with("\x1b[1;36mnote\x1b[0m[I101]"));
    }
}
