//! Compiled artifacts that depend on a source file.

use std::path::{Path, PathBuf};

use depcheck_common::Millis;
use depcheck_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use depcheck_source::Location;
use serde::Serialize;

/// Whether stale artifacts are removed or only reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Remove stale artifacts.
    #[default]
    Delete,
    /// Report what would be removed and leave the files alone.
    DryRun,
}

/// Where the artifacts of a source file live.
///
/// An artifact is `<object dir>/<logical path>` with the source extension
/// replaced by the object extension, once per object directory.
#[derive(Clone, Debug, Default)]
pub struct ObjectLayout {
    dirs: Vec<PathBuf>,
    extension: String,
}

impl ObjectLayout {
    /// Creates a layout over `dirs` producing files with `extension`.
    pub fn new(dirs: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dirs,
            extension: extension.into(),
        }
    }

    /// Artifact paths for a source with the given logical path.
    pub fn artifacts_for(&self, logical_path: &str) -> Vec<PathBuf> {
        let relative = Path::new(logical_path).with_extension(&self.extension);
        self.dirs.iter().map(|dir| dir.join(&relative)).collect()
    }
}

/// What has happened to an artifact this run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionState {
    /// Not touched.
    Untouched,
    /// Removed (or, in a dry run, would have been).
    Deleted,
    /// Was already absent; the build has to produce it.
    MissingNeedsRecompile,
}

/// The artifacts compiled from one source file.
#[derive(Debug)]
pub struct ObjectTarget {
    logical_path: String,
    artifacts: Vec<(PathBuf, DeletionState)>,
    newest_dependency: Millis,
    dirty: bool,
}

impl ObjectTarget {
    /// Creates a target for the source at `logical_path`.
    pub fn new(logical_path: impl Into<String>, artifacts: Vec<PathBuf>) -> Self {
        Self {
            logical_path: logical_path.into(),
            artifacts: artifacts
                .into_iter()
                .map(|p| (p, DeletionState::Untouched))
                .collect(),
            newest_dependency: Millis::ZERO,
            dirty: false,
        }
    }

    /// Logical path of the source this target is compiled from.
    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    /// Artifact paths with their state.
    pub fn artifacts(&self) -> &[(PathBuf, DeletionState)] {
        &self.artifacts
    }

    /// Whether the source or one of its includes changed this run.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Newest dependency timestamp reported to this target.
    pub fn newest_dependency(&self) -> Millis {
        self.newest_dependency
    }

    /// Number of artifacts removed (or reported as removable in a dry run).
    pub fn deleted_count(&self) -> usize {
        self.count(DeletionState::Deleted)
    }

    /// Number of artifacts flagged because they were already absent.
    pub fn missing_count(&self) -> usize {
        self.count(DeletionState::MissingNeedsRecompile)
    }

    fn count(&self, state: DeletionState) -> usize {
        self.artifacts.iter().filter(|(_, s)| *s == state).count()
    }

    /// Tells the target that a dependency is newer than its artifacts.
    ///
    /// Present artifacts are deleted; absent ones are flagged as needing a
    /// recompile. A failed deletion is reported and retried on the next call;
    /// the target stays dirty either way. Returns `true` if this call made the
    /// target dirty.
    pub fn notify_newer(
        &mut self,
        newest_dependency: Millis,
        mode: DeleteMode,
        sink: &DiagnosticSink,
    ) -> bool {
        if newest_dependency > self.newest_dependency {
            self.newest_dependency = newest_dependency;
        }
        let newly = !self.dirty;
        self.dirty = true;

        for (path, state) in &mut self.artifacts {
            if *state != DeletionState::Untouched {
                continue;
            }
            if !path.exists() {
                *state = DeletionState::MissingNeedsRecompile;
                tracing::debug!(path = %path.display(), "object absent, needs recompile");
                sink.emit(
                    Diagnostic::note(
                        DiagnosticCode::OBJECT_MISSING,
                        format!("object for `{}` is missing and must be recompiled", self.logical_path),
                    )
                    .at(Location::file(path.clone())),
                );
                continue;
            }
            let removed = match mode {
                DeleteMode::DryRun => Ok(()),
                DeleteMode::Delete => std::fs::remove_file(&*path),
            };
            match removed {
                Ok(()) => {
                    *state = DeletionState::Deleted;
                    tracing::info!(path = %path.display(), dry_run = mode == DeleteMode::DryRun, "stale object removed");
                    let verb = match mode {
                        DeleteMode::Delete => "deleted",
                        DeleteMode::DryRun => "would delete",
                    };
                    sink.emit(
                        Diagnostic::note(
                            DiagnosticCode::OBJECT_DELETED,
                            format!("{verb} stale object for `{}`", self.logical_path),
                        )
                        .at(Location::file(path.clone())),
                    );
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to delete stale object");
                    sink.emit(
                        Diagnostic::error(
                            DiagnosticCode::OBJECT_DELETE_FAILED,
                            format!("cannot delete stale object: {e}"),
                        )
                        .at(Location::file(path.clone()))
                        .with_help("delete the file by hand before the next build"),
                    );
                }
            }
        }
        newly
    }
}
