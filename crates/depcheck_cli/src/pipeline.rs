//! Shared helpers for CLI commands.
//!
//! Contains project root resolution, compilation unit discovery, and
//! diagnostic rendering used by `check` and `explain`.

use std::path::{Path, PathBuf};

use depcheck_config::CONFIG_FILE;
use depcheck_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `depcheck.toml`.
///
/// Returns the directory containing `depcheck.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `depcheck.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Discovers compilation units below `dir` (recursive), sorted by path.
///
/// A file qualifies when its extension is one of `extensions`. Hidden
/// directories are not entered.
pub fn discover_source_files(
    dir: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    walk_dir(dir, extensions, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_dir(
    dir: &Path,
    extensions: &[String],
    files: &mut Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if !is_hidden(&path) {
                walk_dir(&path, extensions, files)?;
            }
        } else if has_extension(&path, extensions) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Returns `true` if `path` has one of `extensions` (compared without the dot).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x == ext))
}

/// Renders diagnostics from a sink to stderr using the terminal renderer.
///
/// With `quiet`, only errors are shown. Returns the number rendered.
pub fn render_diagnostics(sink: &DiagnosticSink, color: bool, quiet: bool) -> usize {
    let renderer = TerminalRenderer::new(color);
    let mut shown = 0;
    for diag in sink.diagnostics() {
        if quiet && !diag.severity.survives_quiet() {
            continue;
        }
        eprintln!("{}", renderer.render(&diag));
        shown += 1;
    }
    shown
}
