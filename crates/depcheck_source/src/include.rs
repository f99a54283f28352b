//! `#include` recognition and resolution.
//!
//! Includes are found with a plain textual pattern: optional whitespace, `#`,
//! optional whitespace, `include`, then a `"quoted"` or `<angled>` target on
//! the same line. Conditional compilation and macro-expanded includes are not
//! evaluated, so a file can list includes that the compiler would skip. That
//! errs on the side of recompiling too much.

use std::io;
use std::path::{Path, PathBuf};

use crate::paths::{canonical_path, lexical_normalize};
use crate::source_file::SourceFile;

/// How an include target was delimited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    /// `#include "file.h"`: searched next to the including file first.
    Quoted,
    /// `#include <file.h>`: searched in the include paths only.
    Angle,
}

/// One include line found in a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeDirective {
    /// The target exactly as written between the delimiters.
    pub target: String,
    /// Delimiter style.
    pub kind: IncludeKind,
    /// 1-indexed line of the directive.
    pub line: u32,
}

/// Enumerates the include lines of a file.
///
/// The checker only sees includes through this trait, which keeps the
/// recognition rule replaceable and lets tests feed synthetic include lists.
pub trait IncludeScanner {
    /// Returns the include directives of `path` in file order.
    fn include_lines(&self, path: &Path) -> io::Result<Vec<IncludeDirective>>;
}

/// The default scanner: reads the file and applies [`parse_include_line`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TextIncludeScanner;

impl IncludeScanner for TextIncludeScanner {
    fn include_lines(&self, path: &Path) -> io::Result<Vec<IncludeDirective>> {
        Ok(SourceFile::load(path)?.includes())
    }
}

/// Parses a single line, returning the include target and its kind.
pub fn parse_include_line(line: &str) -> Option<(String, IncludeKind)> {
    let rest = line.trim_start().strip_prefix('#')?;
    let rest = rest.trim_start().strip_prefix("include")?;
    let rest = rest.trim_start();
    let (close, kind) = match rest.chars().next()? {
        '"' => ('"', IncludeKind::Quoted),
        '<' => ('>', IncludeKind::Angle),
        _ => return None,
    };
    let body = &rest[1..];
    let end = body.find(close)?;
    let target = body[..end].trim();
    if target.is_empty() {
        return None;
    }
    Some((target.to_string(), kind))
}

/// Resolves include targets to files on disk.
#[derive(Debug, Default, Clone)]
pub struct IncludeResolver {
    include_paths: Vec<PathBuf>,
}

impl IncludeResolver {
    /// Creates a resolver searching `include_paths` in order.
    pub fn new(include_paths: Vec<PathBuf>) -> Self {
        Self { include_paths }
    }

    /// The configured search directories.
    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    /// Finds the file a directive refers to.
    ///
    /// Quoted includes try the including file's directory before the include
    /// paths. Absolute targets are taken as-is. Returns `None` when nothing
    /// matches.
    pub fn resolve(&self, directive: &IncludeDirective, including_file: &Path) -> Option<PathBuf> {
        let target = Path::new(&directive.target);
        if target.is_absolute() {
            return target.is_file().then(|| canonical_path(target));
        }
        let local = match directive.kind {
            IncludeKind::Quoted => including_file.parent().map(|dir| dir.join(target)),
            IncludeKind::Angle => None,
        };
        local
            .into_iter()
            .chain(self.include_paths.iter().map(|dir| dir.join(target)))
            .find(|candidate| candidate.is_file())
            .map(|found| canonical_path(&found))
    }

    /// The identity given to an include that could not be found: the target
    /// joined to the including file's directory.
    pub fn unresolved_path(directive: &IncludeDirective, including_file: &Path) -> PathBuf {
        let dir = including_file.parent().unwrap_or_else(|| Path::new(""));
        lexical_normalize(&canonical_path(dir).join(&directive.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_quoted() {
        assert_eq!(
            parse_include_line("#include \"util/str.h\""),
            Some(("util/str.h".to_string(), IncludeKind::Quoted))
        );
    }

    #[test]
    fn parse_angle() {
        assert_eq!(
            parse_include_line("#include <vector>"),
            Some(("vector".to_string(), IncludeKind::Angle))
        );
    }

    #[test]
    fn parse_with_spacing() {
        assert_eq!(
            parse_include_line("  #  include   \"a.h\"  // comment"),
            Some(("a.h".to_string(), IncludeKind::Quoted))
        );
        assert_eq!(
            parse_include_line("\t#include<b.h>"),
            Some(("b.h".to_string(), IncludeKind::Angle))
        );
    }

    #[test]
    fn rejects_non_includes() {
        assert!(parse_include_line("#define INCLUDE 1").is_none());
        assert!(parse_include_line("// #include \"a.h\"").is_none());
        assert!(parse_include_line("#include MACRO_HEADER").is_none());
        assert!(parse_include_line("#include \"unterminated.h").is_none());
        assert!(parse_include_line("#include \"\"").is_none());
        assert!(parse_include_line("int include = 0;").is_none());
    }

    #[test]
    fn text_scanner_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.c");
        fs::write(&path, "#include \"a.h\"\n#include <b.h>\n").unwrap();
        let lines = TextIncludeScanner.include_lines(&path).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].line, 2);
    }

    #[test]
    fn text_scanner_missing_file() {
        let err = TextIncludeScanner
            .include_lines(Path::new("/nonexistent/depcheck/main.c"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    fn directive(target: &str, kind: IncludeKind) -> IncludeDirective {
        IncludeDirective {
            target: target.to_string(),
            kind,
            line: 1,
        }
    }

    #[test]
    fn quoted_prefers_local_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("include")).unwrap();
        fs::write(dir.path().join("src/config.h"), "").unwrap();
        fs::write(dir.path().join("include/config.h"), "").unwrap();
        let resolver = IncludeResolver::new(vec![dir.path().join("include")]);
        let includer = dir.path().join("src/main.c");

        let quoted = resolver
            .resolve(&directive("config.h", IncludeKind::Quoted), &includer)
            .unwrap();
        assert_eq!(quoted, canonical_path(&dir.path().join("src/config.h")));

        let angle = resolver
            .resolve(&directive("config.h", IncludeKind::Angle), &includer)
            .unwrap();
        assert_eq!(angle, canonical_path(&dir.path().join("include/config.h")));
    }

    #[test]
    fn include_paths_searched_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("first")).unwrap();
        fs::create_dir_all(dir.path().join("second")).unwrap();
        fs::write(dir.path().join("second/only.h"), "").unwrap();
        fs::write(dir.path().join("first/both.h"), "").unwrap();
        fs::write(dir.path().join("second/both.h"), "").unwrap();
        let resolver = IncludeResolver::new(vec![
            dir.path().join("first"),
            dir.path().join("second"),
        ]);
        let includer = dir.path().join("main.c");
        let only = resolver
            .resolve(&directive("only.h", IncludeKind::Angle), &includer)
            .unwrap();
        assert_eq!(only, canonical_path(&dir.path().join("second/only.h")));
        let both = resolver
            .resolve(&directive("both.h", IncludeKind::Angle), &includer)
            .unwrap();
        assert_eq!(both, canonical_path(&dir.path().join("first/both.h")));
    }

    #[test]
    fn unresolvable_include() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = IncludeResolver::new(vec![]);
        let includer = dir.path().join("main.c");
        let d = directive("gone.h", IncludeKind::Quoted);
        assert!(resolver.resolve(&d, &includer).is_none());
        let guess = IncludeResolver::unresolved_path(&d, &includer);
        assert!(guess.ends_with("gone.h"));
    }
}
