//! Path resolution: turning the configured relative paths into absolute ones.

use crate::types::DepcheckConfig;
use std::path::{Path, PathBuf};

/// A configured directory that could not be used.
///
/// These are warnings, never errors: the run proceeds without the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPath {
    /// The configuration key the path came from, e.g. `includes.paths`.
    pub key: &'static str,
    /// The path after joining it to the project directory.
    pub path: PathBuf,
}

/// A configuration with every path made absolute.
///
/// Source roots and include paths that are not existing directories have
/// been dropped and listed in `unresolved`. Object, mirror and snapshot
/// locations are kept even when absent; they are created by builds.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The project directory all relative paths were resolved against.
    pub project_dir: PathBuf,
    /// Source roots with their logical prefixes, in priority order.
    pub source_roots: Vec<(PathBuf, Option<String>)>,
    /// Include search directories, in search order.
    pub include_paths: Vec<PathBuf>,
    /// Object directories, one per build flavour.
    pub object_dirs: Vec<PathBuf>,
    /// Object file extension without the dot.
    pub object_extension: String,
    /// Root of the mirror tree, if configured.
    pub mirror_dir: Option<PathBuf>,
    /// Location of the dependency snapshot.
    pub snapshot_path: PathBuf,
    /// Extensions of compilation units.
    pub extensions: Vec<String>,
    /// Configured directories that were skipped.
    pub unresolved: Vec<UnresolvedPath>,
}

/// Resolves every path in `config` against `project_dir`.
pub fn resolve_config(config: &DepcheckConfig, project_dir: &Path) -> ResolvedConfig {
    let mut unresolved = Vec::new();

    let source_roots = config
        .sources
        .iter()
        .filter_map(|root| {
            existing_dir(project_dir, &root.dir, "sources.dir", &mut unresolved)
                .map(|dir| (dir, root.prefix.clone()))
        })
        .collect();

    let include_paths = config
        .includes
        .paths
        .iter()
        .filter_map(|p| existing_dir(project_dir, p, "includes.paths", &mut unresolved))
        .collect();

    ResolvedConfig {
        project_dir: project_dir.to_path_buf(),
        source_roots,
        include_paths,
        object_dirs: config
            .objects
            .dirs
            .iter()
            .map(|d| project_dir.join(d))
            .collect(),
        object_extension: config.objects.extension.clone(),
        mirror_dir: config.mirror.as_ref().map(|m| project_dir.join(&m.dir)),
        snapshot_path: project_dir.join(&config.snapshot.path),
        extensions: config.scan.extensions.clone(),
        unresolved,
    }
}

fn existing_dir(
    project_dir: &Path,
    configured: &str,
    key: &'static str,
    unresolved: &mut Vec<UnresolvedPath>,
) -> Option<PathBuf> {
    let path = project_dir.join(configured);
    if path.is_dir() {
        Some(path)
    } else {
        tracing::warn!(key, path = %path.display(), "configured directory not found, skipping");
        unresolved.push(UnresolvedPath { key, path });
        None
    }
}
