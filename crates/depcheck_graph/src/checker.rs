//! Per-file staleness detection.
//!
//! [`Checker::process_source_file`] decides whether a file changed since the
//! last snapshot, follows its includes depth first, links everything into the
//! [`DependencyIndex`], and invalidates the objects of every source that ends
//! up dirty.

use std::fs;
use std::path::{Path, PathBuf};

use depcheck_common::{ContentHash, Freshness, Millis};
use depcheck_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use depcheck_source::paths::canonical_path;
use depcheck_source::{
    IncludeDirective, IncludeKind, IncludeResolver, IncludeScanner, Location, SourcePool,
};

use crate::index::DependencyIndex;
use crate::node::NodeId;
use crate::object::{DeleteMode, ObjectLayout, ObjectTarget};
use crate::state::StaleState;

/// Run-wide settings for a [`Checker`].
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    /// Root of the mirror tree; `None` disables content comparison.
    pub mirror_dir: Option<PathBuf>,
    /// Where object files are found.
    pub objects: ObjectLayout,
    /// Whether stale objects are deleted or only reported.
    pub delete_mode: DeleteMode,
}

/// Decides staleness of source files against the previous snapshot.
pub struct Checker<'a> {
    pool: &'a dyn SourcePool,
    scanner: &'a dyn IncludeScanner,
    resolver: IncludeResolver,
    options: CheckOptions,
}

/// A file to visit next, with the include text that led to it.
struct PendingInclude {
    path: PathBuf,
    written_as: Option<String>,
}

impl<'a> Checker<'a> {
    /// Creates a checker.
    pub fn new(
        pool: &'a dyn SourcePool,
        scanner: &'a dyn IncludeScanner,
        resolver: IncludeResolver,
        options: CheckOptions,
    ) -> Self {
        Self {
            pool,
            scanner,
            resolver,
            options,
        }
    }

    /// Processes a compilation unit and everything it includes.
    ///
    /// Safe to call for a file that was already reached as an include; the
    /// earlier result is reused and only the object target is added.
    pub fn process_source_file(
        &self,
        index: &mut DependencyIndex,
        path: &Path,
        sink: &DiagnosticSink,
    ) -> NodeId {
        let id = self.process(index, &canonical_path(path), sink);
        self.attach_target(index, id, sink);
        id
    }

    fn process(&self, index: &mut DependencyIndex, path: &Path, sink: &DiagnosticSink) -> NodeId {
        let id = index.lookup_or_create(path);
        if !index.begin(id) {
            return id;
        }

        for include in self.assess(index, id, path, sink) {
            let child = self.process(index, &include.path, sink);
            if let Some(written_as) = &include.written_as {
                index.node_mut(child).set_written_as(written_as);
            }
            let link = index.add_dependency(id, child);
            if link.closes_cycle {
                self.report_cycle(index, id, child, sink);
            }
            index.notify_targets(&link.newly_dirty, self.options.delete_mode, sink);
        }

        index.finish(id);
        id
    }

    /// Sets the node's own state and returns the includes to follow.
    fn assess(
        &self,
        index: &mut DependencyIndex,
        id: NodeId,
        path: &Path,
        sink: &DiagnosticSink,
    ) -> Vec<PendingInclude> {
        let logical = self.pool.classify(path);
        let mirror = match (&self.options.mirror_dir, &logical) {
            (Some(dir), Some(logical)) => Some(dir.join(logical)),
            _ => None,
        };
        index.node_mut(id).set_pool_location(logical, mirror.clone());

        let source_time = match Millis::of_file(path) {
            Ok(time) => time,
            Err(e) => {
                self.report_unreadable(path, &e, sink);
                let newly_dirty = index.notify_missing(id);
                index.notify_targets(&newly_dirty, self.options.delete_mode, sink);
                return Vec::new();
            }
        };
        let mirror_time = mirror
            .as_deref()
            .map_or(Millis::ZERO, Millis::of_file_or_zero);
        index.node_mut(id).set_times(source_time, mirror_time);

        let recorded = index.node(id).recorded().cloned();
        let freshness = match &recorded {
            None => {
                index.count_new();
                Freshness::Untrusted
            }
            Some(rec) => {
                let source = Freshness::compare(source_time, rec.source_time);
                if mirror.is_some() {
                    source.and(Freshness::compare(mirror_time, rec.mirror_time))
                } else {
                    source
                }
            }
        };

        match (freshness, recorded) {
            (Freshness::Exact, Some(rec)) => {
                tracing::debug!(path = %path.display(), "unchanged");
                recorded_includes(rec.includes)
            }
            (Freshness::WithinTolerance, Some(rec)) => {
                tracing::debug!(path = %path.display(), "timestamp within tolerance");
                index.notify_timestamp_changed(id);
                recorded_includes(rec.includes)
            }
            _ => self.rescan(index, id, path, mirror.as_deref(), sink),
        }
    }

    /// Reads the include lines and compares content with the mirror copy.
    fn rescan(
        &self,
        index: &mut DependencyIndex,
        id: NodeId,
        path: &Path,
        mirror: Option<&Path>,
        sink: &DiagnosticSink,
    ) -> Vec<PendingInclude> {
        let directives = match self.scanner.include_lines(path) {
            Ok(directives) => directives,
            Err(e) => {
                self.report_unreadable(path, &e, sink);
                let newly_dirty = index.notify_missing(id);
                index.notify_targets(&newly_dirty, self.options.delete_mode, sink);
                return Vec::new();
            }
        };
        index.count_scanned();

        let includes = directives
            .iter()
            .map(|directive| self.resolve(directive, path, sink))
            .collect();

        if mirror.is_some_and(|m| same_content(path, m)) {
            tracing::debug!(path = %path.display(), "content matches mirror");
            index.notify_timestamp_changed(id);
        } else {
            tracing::debug!(path = %path.display(), "changed");
            let mirror_time = match mirror {
                Some(m) => self.refresh_mirror(path, m, index.node(id).mirror_time(), sink),
                None => Millis::ZERO,
            };
            let newly_dirty = index.notify_dirty(id, mirror_time);
            index.notify_targets(&newly_dirty, self.options.delete_mode, sink);
        }
        includes
    }

    fn resolve(
        &self,
        directive: &IncludeDirective,
        including: &Path,
        sink: &DiagnosticSink,
    ) -> PendingInclude {
        let path = match self.resolver.resolve(directive, including) {
            Some(found) => found,
            None => {
                let guess = IncludeResolver::unresolved_path(directive, including);
                match directive.kind {
                    IncludeKind::Quoted => sink.emit(
                        Diagnostic::warning(
                            DiagnosticCode::UNRESOLVED_INCLUDE,
                            format!("cannot find include `{}`", directive.target),
                        )
                        .at(Location::line(including, directive.line)),
                    ),
                    IncludeKind::Angle => {
                        tracing::debug!(include = %directive.target, "system include not found")
                    }
                }
                guess
            }
        };
        PendingInclude {
            path,
            written_as: Some(directive.target.clone()),
        }
    }

    /// Copies a changed pool file into the mirror tree. Skipped in dry runs.
    fn refresh_mirror(
        &self,
        source: &Path,
        mirror: &Path,
        current: Millis,
        sink: &DiagnosticSink,
    ) -> Millis {
        if self.options.delete_mode == DeleteMode::DryRun {
            return current;
        }
        let copied = mirror
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::copy(source, mirror))
            .and_then(|_| Millis::of_file(mirror));
        match copied {
            Ok(time) => time,
            Err(e) => {
                tracing::warn!(path = %mirror.display(), error = %e, "mirror refresh failed");
                sink.emit(
                    Diagnostic::error(
                        DiagnosticCode::MIRROR_WRITE_FAILED,
                        format!("cannot update mirror copy: {e}"),
                    )
                    .at(Location::file(mirror)),
                );
                current
            }
        }
    }

    /// Gives a pool-resident compilation unit its object target.
    fn attach_target(&self, index: &mut DependencyIndex, id: NodeId, sink: &DiagnosticSink) {
        if index.target(id).is_some() {
            return;
        }
        let node = index.node(id);
        if node.state() == StaleState::Missing {
            return;
        }
        let Some(logical) = node.logical_path() else {
            return;
        };
        let target = ObjectTarget::new(logical, self.options.objects.artifacts_for(logical));
        let dirty = node.state().is_dirty_or_via_include();
        index.attach_target(id, target);
        if dirty {
            index.notify_targets(&[id], self.options.delete_mode, sink);
        }
    }

    fn report_cycle(
        &self,
        index: &DependencyIndex,
        parent: NodeId,
        child: NodeId,
        sink: &DiagnosticSink,
    ) {
        let parent = index.node(parent).path();
        let child = index.node(child).path();
        tracing::warn!(parent = %parent.display(), child = %child.display(), "include cycle");
        sink.emit(
            Diagnostic::warning(
                DiagnosticCode::INCLUDE_CYCLE,
                format!(
                    "include cycle: {} -> {} closes a loop",
                    parent.display(),
                    child.display()
                ),
            )
            .at(Location::file(parent)),
        );
    }

    fn report_unreadable(&self, path: &Path, error: &std::io::Error, sink: &DiagnosticSink) {
        if path.exists() {
            tracing::warn!(path = %path.display(), %error, "cannot read file");
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::UNREADABLE_SOURCE,
                    format!("cannot read file: {error}"),
                )
                .at(Location::file(path)),
            );
        } else {
            tracing::debug!(path = %path.display(), "file missing");
        }
    }
}

fn recorded_includes(paths: Vec<PathBuf>) -> Vec<PendingInclude> {
    paths
        .into_iter()
        .map(|path| PendingInclude {
            path,
            written_as: None,
        })
        .collect()
}

fn same_content(source: &Path, mirror: &Path) -> bool {
    match (ContentHash::from_file(source), ContentHash::from_file(mirror)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
