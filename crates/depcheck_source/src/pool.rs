//! Declared source pool: which files belong to the project and under which
//! logical path.
//!
//! A pool is an ordered list of root directories, each with an optional
//! logical prefix. A file inside a root gets the logical path
//! `<prefix>/<path below root>`; that logical path names its object files and
//! its mirror copy, so it must not depend on where the checkout lives.

use std::path::{Path, PathBuf};

use crate::paths::{canonical_path, normalized, strip_root};

/// Classifies absolute paths into pool-relative logical paths.
///
/// This is the seam between the dependency checker and whatever decides
/// project membership; tests substitute simple in-memory implementations.
pub trait SourcePool {
    /// Returns the logical path of `path`, or `None` if it is outside the pool.
    fn classify(&self, path: &Path) -> Option<String>;
}

/// One declared source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRoot {
    /// Canonical directory of the root.
    pub dir: PathBuf,
    /// Logical prefix prepended to paths below `dir` (may be empty).
    pub prefix: String,
    normalized_dir: String,
}

impl PoolRoot {
    fn new(dir: PathBuf, prefix: String) -> Self {
        let normalized_dir = normalized(&dir);
        Self {
            dir,
            prefix: prefix.trim_matches('/').to_string(),
            normalized_dir,
        }
    }

    fn logical_path(&self, rest: &str) -> String {
        match (self.prefix.is_empty(), rest.is_empty()) {
            (true, _) => rest.to_string(),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{}", self.prefix, rest),
        }
    }
}

/// The standard [`SourcePool`]: first matching declared root wins.
#[derive(Debug, Default, Clone)]
pub struct SourcePoolMapper {
    roots: Vec<PoolRoot>,
    skipped: Vec<PathBuf>,
}

impl SourcePoolMapper {
    /// Builds a mapper from `(directory, logical prefix)` pairs, in priority
    /// order.
    ///
    /// Directories that do not exist or are not directories are skipped and
    /// reported through [`skipped`](Self::skipped); they never fail the run.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = (P, Option<String>)>,
        P: AsRef<Path>,
    {
        let mut mapper = Self::default();
        for (dir, prefix) in roots {
            let dir = dir.as_ref();
            if !dir.is_dir() {
                tracing::warn!(dir = %dir.display(), "source root is not a directory, skipping");
                mapper.skipped.push(dir.to_path_buf());
                continue;
            }
            let canonical = canonical_path(dir);
            mapper
                .roots
                .push(PoolRoot::new(canonical, prefix.unwrap_or_default()));
        }
        mapper
    }

    /// The declared roots that were resolved, in priority order.
    pub fn roots(&self) -> &[PoolRoot] {
        &self.roots
    }

    /// Configured roots that could not be resolved.
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }
}

impl SourcePool for SourcePoolMapper {
    fn classify(&self, path: &Path) -> Option<String> {
        let canonical = canonical_path(path);
        let path_str = normalized(&canonical);
        self.roots.iter().find_map(|root| {
            strip_root(&path_str, &root.normalized_dir).map(|rest| root.logical_path(rest))
        })
    }
}
