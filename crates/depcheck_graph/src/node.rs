//! Dependency nodes: one per physical file seen during a run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use depcheck_common::Millis;
use depcheck_source::paths::normalized;

use crate::state::{StaleEvent, StaleState};

/// Handle to a node inside a [`DependencyIndex`](crate::DependencyIndex).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a handle from its arena index.
    pub fn from_raw(index: u32) -> Self {
        NodeId(index)
    }

    /// Returns the arena index.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// What the previous snapshot said about a file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recorded {
    /// Source timestamp at the time of the last run.
    pub source_time: Millis,
    /// Mirror timestamp at the time of the last run, zero without a mirror.
    pub mirror_time: Millis,
    /// Direct includes, as canonical paths.
    pub includes: Vec<PathBuf>,
}

impl Recorded {
    /// Whether the file was on disk when the snapshot was written.
    ///
    /// Missing files are recorded with a zero timestamp.
    pub fn existed(&self) -> bool {
        !self.source_time.is_zero()
    }
}

/// A source file or header and its place in the include graph.
///
/// Relation sets hold handles into the owning index. `included_all` and
/// `including_all` are transitive closures kept up to date on every edge
/// insertion; the `_primary` sets hold only direct edges and are subsets of
/// the closures.
#[derive(Debug)]
pub struct DependencyNode {
    path: PathBuf,
    written_as: Option<String>,
    logical_path: Option<String>,
    mirror_path: Option<PathBuf>,
    source_time: Millis,
    mirror_time: Millis,
    newest_dependency: Millis,
    state: StaleState,
    recorded: Option<Recorded>,
    pub(crate) included_primary: BTreeSet<NodeId>,
    pub(crate) included_all: BTreeSet<NodeId>,
    pub(crate) including_primary: BTreeSet<NodeId>,
    pub(crate) including_all: BTreeSet<NodeId>,
    record_line: Option<(bool, String)>,
}

impl DependencyNode {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            written_as: None,
            logical_path: None,
            mirror_path: None,
            source_time: Millis::ZERO,
            mirror_time: Millis::ZERO,
            newest_dependency: Millis::ZERO,
            state: StaleState::Unchanged,
            recorded: None,
            included_primary: BTreeSet::new(),
            included_all: BTreeSet::new(),
            including_primary: BTreeSet::new(),
            including_all: BTreeSet::new(),
            record_line: None,
        }
    }

    /// Canonical absolute path; the node's identity.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The include target as first written by an including file.
    pub fn written_as(&self) -> Option<&str> {
        self.written_as.as_deref()
    }

    /// Pool-relative logical path, `None` outside the declared source pool.
    pub fn logical_path(&self) -> Option<&str> {
        self.logical_path.as_deref()
    }

    /// Whether the file lies in a declared source root.
    pub fn in_pool(&self) -> bool {
        self.logical_path.is_some()
    }

    /// Location of this file's copy in the mirror tree.
    pub fn mirror_path(&self) -> Option<&Path> {
        self.mirror_path.as_deref()
    }

    /// Observed modification time of the file.
    pub fn source_time(&self) -> Millis {
        self.source_time
    }

    /// Observed modification time of the mirror copy, zero if absent.
    pub fn mirror_time(&self) -> Millis {
        self.mirror_time
    }

    /// The newest source timestamp among this file and everything it includes.
    pub fn newest_dependency(&self) -> Millis {
        self.newest_dependency
    }

    /// Current staleness.
    pub fn state(&self) -> StaleState {
        self.state
    }

    /// Data loaded from the previous snapshot, if the file was in it.
    pub fn recorded(&self) -> Option<&Recorded> {
        self.recorded.as_ref()
    }

    /// Direct includes.
    pub fn included_primary(&self) -> &BTreeSet<NodeId> {
        &self.included_primary
    }

    /// Direct and indirect includes.
    pub fn included_all(&self) -> &BTreeSet<NodeId> {
        &self.included_all
    }

    /// Files that include this one directly.
    pub fn including_primary(&self) -> &BTreeSet<NodeId> {
        &self.including_primary
    }

    /// Files that include this one directly or indirectly.
    pub fn including_all(&self) -> &BTreeSet<NodeId> {
        &self.including_all
    }

    pub(crate) fn set_written_as(&mut self, written_as: &str) {
        if self.written_as.is_none() {
            self.written_as = Some(written_as.to_string());
        }
    }

    pub(crate) fn set_pool_location(&mut self, logical: Option<String>, mirror: Option<PathBuf>) {
        self.logical_path = logical;
        self.mirror_path = mirror;
        self.record_line = None;
    }

    pub(crate) fn set_times(&mut self, source: Millis, mirror: Millis) {
        self.source_time = source;
        self.mirror_time = mirror;
        if source > self.newest_dependency {
            self.newest_dependency = source;
        }
        self.record_line = None;
    }

    pub(crate) fn set_recorded(&mut self, recorded: Recorded) {
        self.recorded = Some(recorded);
    }

    pub(crate) fn raise_newest_dependency(&mut self, time: Millis) {
        if time > self.newest_dependency {
            self.newest_dependency = time;
        }
    }

    /// Applies an event; returns `true` if the state changed.
    pub(crate) fn apply(&mut self, event: StaleEvent) -> bool {
        let next = self.state.on(event);
        if next == self.state {
            return false;
        }
        tracing::debug!(path = %self.path.display(), from = ?self.state, to = ?next, "state change");
        self.state = next;
        self.record_line = None;
        true
    }

    /// Marks the file itself changed, recording the refreshed mirror time.
    pub(crate) fn notify_dirty(&mut self, mirror_time: Millis) -> bool {
        self.mirror_time = mirror_time;
        self.record_line = None;
        self.apply(StaleEvent::Dirty)
    }

    /// The record part of this node's snapshot entry.
    ///
    /// Built on first use and rebuilt only after the node changes.
    pub fn record_line(&mut self, with_mirror: bool) -> &str {
        let stale = !matches!(&self.record_line, Some((mode, _)) if *mode == with_mirror);
        if stale {
            let line = self.build_record_line(with_mirror);
            self.record_line = Some((with_mirror, line));
        }
        self.record_line.as_ref().map_or("", |(_, line)| line.as_str())
    }

    fn build_record_line(&self, with_mirror: bool) -> String {
        let source = normalized(&self.path);
        if !with_mirror {
            return format!(
                "{}; {}; {}",
                self.source_time.format_date(),
                self.source_time,
                source
            );
        }
        let mirror = self
            .mirror_path
            .as_deref()
            .map_or_else(|| "-".to_string(), normalized);
        format!(
            "{}; {}; {}; {}; {}; {}; {}",
            self.mirror_time.format_date(),
            self.mirror_time,
            mirror,
            self.state.as_char(),
            source,
            self.source_time,
            self.source_time.format_date()
        )
    }
}
