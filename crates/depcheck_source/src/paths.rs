//! Path canonicalization and separator normalization.
//!
//! Prefix matching against declared roots and node identity both rely on one
//! spelling per file, so every path entering the dependency graph goes through
//! [`canonical_path`] and is compared in its [`normalized`] string form.

use std::path::{Component, Path, PathBuf};

/// Canonicalizes `path` when it exists, otherwise falls back to a lexical
/// normalization that resolves `.` and `..` components.
///
/// Include targets that do not exist on disk still need a stable identity, so
/// this never fails.
pub fn canonical_path(path: &Path) -> PathBuf {
    match std::fs::canonicalize(path) {
        Ok(canonical) => strip_verbatim(canonical),
        Err(_) => lexical_normalize(path),
    }
}

/// Resolves `.` and `..` components without touching the file system.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Renders a path with `/` separators regardless of platform.
pub fn normalized(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '\\' {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// Returns the part of `path` below `root`, both in normalized form, if
/// `root` is a prefix of `path` on a component boundary.
pub fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let root = root.trim_end_matches('/');
    let rest = path.strip_prefix(root)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Windows `canonicalize` yields `\\?\C:\...`; the verbatim prefix would break
/// prefix comparisons with user-supplied paths.
fn strip_verbatim(path: PathBuf) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix(r"\\?\") {
        Some(rest) => PathBuf::from(rest),
        None => path,
    }
}
