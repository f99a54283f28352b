//! The run-scoped registry of dependency nodes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use depcheck_common::{Millis, PathInterner, PathKey};
use depcheck_diagnostics::DiagnosticSink;
use depcheck_source::paths::normalized;
use serde::Serialize;

use crate::node::{DependencyNode, NodeId, Recorded};
use crate::object::{DeleteMode, ObjectTarget};
use crate::snapshot::Snapshot;
use crate::state::{StaleEvent, StaleState};

/// Counters reported at the end of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Files visited this run.
    pub files: usize,
    /// Files whose include lines were read.
    pub scanned: usize,
    /// Files absent from the previous snapshot.
    pub new_files: usize,
    /// Files whose own content changed.
    pub changed: usize,
    /// Files with a new timestamp but identical content.
    pub timestamp_only: usize,
    /// Files stale only because something they include changed.
    pub dirty_via_include: usize,
    /// Files with nothing to do.
    pub unchanged: usize,
    /// Files that could not be read.
    pub missing: usize,
    /// Stale object files deleted (or that would be, in a dry run).
    pub deleted_objects: usize,
    /// Object files that were already absent.
    pub missing_objects: usize,
    /// Sources whose objects were invalidated.
    pub forced_recompiles: usize,
}

/// Outcome of [`DependencyIndex::add_dependency`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Link {
    /// Nodes that became dirty through the new edge.
    pub newly_dirty: Vec<NodeId>,
    /// Whether `child` already included `parent`, directly or not.
    pub closes_cycle: bool,
}

/// All nodes of one run, keyed by canonical path.
///
/// Nodes live in an arena and refer to each other by [`NodeId`]. Nothing is
/// removed during a run; looking up a path twice yields the same node.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    interner: PathInterner,
    by_key: HashMap<PathKey, NodeId>,
    nodes: Vec<DependencyNode>,
    in_progress: HashSet<NodeId>,
    processed: HashSet<NodeId>,
    vanished: HashSet<NodeId>,
    targets: BTreeMap<NodeId, ObjectTarget>,
    scanned: usize,
    new_files: usize,
}

impl DependencyIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index carrying the recorded state of a previous snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut index = Self::new();
        for record in snapshot.records() {
            let id = index.lookup_or_create(&record.source_path);
            index.nodes[id.index()].set_recorded(Recorded {
                source_time: record.source_time,
                mirror_time: record.mirror_time,
                includes: record.direct_includes().map(Path::to_path_buf).collect(),
            });
        }
        index
    }

    /// Returns the node for `path`, creating it on first reference.
    ///
    /// `path` is expected to be canonical already.
    pub fn lookup_or_create(&mut self, path: &Path) -> NodeId {
        let key = self.interner.get_or_intern(&normalized(path));
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(DependencyNode::new(path.to_path_buf()));
        self.by_key.insert(key, id);
        id
    }

    /// Returns the node for `path` if it has been seen.
    pub fn lookup(&self, path: &Path) -> Option<NodeId> {
        let key = self.interner.get(&normalized(path))?;
        self.by_key.get(&key).copied()
    }

    /// Borrows a node.
    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut DependencyNode {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes, visited or only recorded.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &DependencyNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::from_raw(i as u32), node))
    }

    /// Whether the node has been fully processed this run.
    pub fn is_processed(&self, id: NodeId) -> bool {
        self.processed.contains(&id)
    }

    /// Nodes processed this run, sorted by path.
    pub fn processed_sorted(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.processed.iter().copied().collect();
        ids.sort_by(|a, b| self.node(*a).path().cmp(self.node(*b).path()));
        ids
    }

    /// Marks a node as being processed. Returns `false` if it is already
    /// processed or in progress, in which case the caller must not recurse.
    pub(crate) fn begin(&mut self, id: NodeId) -> bool {
        !self.processed.contains(&id) && self.in_progress.insert(id)
    }

    pub(crate) fn finish(&mut self, id: NodeId) {
        self.in_progress.remove(&id);
        self.processed.insert(id);
    }

    pub(crate) fn count_scanned(&mut self) {
        self.scanned += 1;
    }

    pub(crate) fn count_new(&mut self) {
        self.new_files += 1;
    }

    /// Links `parent` to a file it includes directly.
    ///
    /// Both transitive closures are extended for `parent`, its includers,
    /// `child` and everything `child` includes. A node never enters its own
    /// closure, so an edge that closes a cycle is recorded like any other and
    /// only flagged in the returned [`Link`]. If `child` changed, `parent` and
    /// its includers become dirty via include.
    pub fn add_dependency(&mut self, parent: NodeId, child: NodeId) -> Link {
        let closes_cycle = parent == child || self.node(child).included_all.contains(&parent);

        self.node_mut(parent).included_primary.insert(child);
        self.node_mut(child).including_primary.insert(parent);

        let up: Vec<NodeId> = std::iter::once(parent)
            .chain(self.node(parent).including_all.iter().copied())
            .collect();
        let down: Vec<NodeId> = std::iter::once(child)
            .chain(self.node(child).included_all.iter().copied())
            .collect();
        let newest = self.node(child).newest_dependency();
        for &u in &up {
            let node = &mut self.nodes[u.index()];
            node.included_all.extend(down.iter().copied().filter(|&d| d != u));
            node.raise_newest_dependency(newest);
        }
        for &d in &down {
            let node = &mut self.nodes[d.index()];
            node.including_all.extend(up.iter().copied().filter(|&u| u != d));
        }

        let newly_dirty = if self.changes_includers(child) {
            self.propagate_via_include(parent)
        } else {
            Vec::new()
        };
        Link {
            newly_dirty,
            closes_cycle,
        }
    }

    /// Marks a node's own content as changed and propagates to its includers.
    ///
    /// Returns the nodes that became dirty, the node itself included.
    pub fn notify_dirty(&mut self, id: NodeId, mirror_time: Millis) -> Vec<NodeId> {
        let was_dirty = self.node(id).state().is_dirty_or_via_include();
        self.node_mut(id).notify_dirty(mirror_time);
        let mut newly = if was_dirty { Vec::new() } else { vec![id] };
        newly.extend(self.propagate_to_includers(id));
        newly
    }

    /// Records that a node's timestamp moved without a content change.
    pub fn notify_timestamp_changed(&mut self, id: NodeId) {
        self.node_mut(id).apply(StaleEvent::TimestampChanged);
    }

    /// Records that a node's file could not be read.
    ///
    /// A file the previous snapshot saw on disk has been removed or moved, so
    /// its includers may now pick up a different header: they become dirty
    /// via include and are returned. A file that was already missing, or was
    /// never recorded, leaves its includers alone.
    pub fn notify_missing(&mut self, id: NodeId) -> Vec<NodeId> {
        self.node_mut(id).apply(StaleEvent::Missing);
        let existed = self.node(id).recorded().is_some_and(Recorded::existed);
        if existed && self.vanished.insert(id) {
            self.propagate_to_includers(id)
        } else {
            Vec::new()
        }
    }

    /// Whether a node's includers must be treated as changed.
    fn changes_includers(&self, id: NodeId) -> bool {
        self.node(id).state().is_dirty_or_via_include() || self.vanished.contains(&id)
    }

    fn propagate_to_includers(&mut self, id: NodeId) -> Vec<NodeId> {
        let includers: Vec<NodeId> = self.node(id).including_primary.iter().copied().collect();
        let mut newly = Vec::new();
        for includer in includers {
            newly.extend(self.propagate_via_include(includer));
        }
        newly
    }

    /// Walks up from `start` marking every includer dirty via include.
    fn propagate_via_include(&mut self, start: NodeId) -> Vec<NodeId> {
        let mut newly = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = &mut self.nodes[id.index()];
            let was_dirty = node.state().is_dirty_or_via_include();
            node.apply(StaleEvent::DirtyViaInclude);
            if !was_dirty && node.state().is_dirty_or_via_include() {
                newly.push(id);
            }
            stack.extend(node.including_primary.iter().copied());
        }
        newly
    }

    /// Associates an object target with a node.
    pub fn attach_target(&mut self, id: NodeId, target: ObjectTarget) {
        self.targets.insert(id, target);
    }

    /// The object target compiled from a node, if any.
    pub fn target(&self, id: NodeId) -> Option<&ObjectTarget> {
        self.targets.get(&id)
    }

    /// Iterates over all object targets.
    pub fn targets(&self) -> impl Iterator<Item = (NodeId, &ObjectTarget)> {
        self.targets.iter().map(|(id, t)| (*id, t))
    }

    /// Passes each node's newest dependency time to its object target.
    pub fn notify_targets(&mut self, ids: &[NodeId], mode: DeleteMode, sink: &DiagnosticSink) {
        for &id in ids {
            let newest = self.nodes[id.index()].newest_dependency();
            if let Some(target) = self.targets.get_mut(&id) {
                target.notify_newer(newest, mode, sink);
            }
        }
    }

    /// Counters for the nodes processed so far.
    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats {
            files: self.processed.len(),
            scanned: self.scanned,
            new_files: self.new_files,
            ..RunStats::default()
        };
        for id in &self.processed {
            match self.node(*id).state() {
                StaleState::Unchanged => stats.unchanged += 1,
                StaleState::TimestampOnly => stats.timestamp_only += 1,
                StaleState::DirtyViaInclude | StaleState::TimestampOnlyViaInclude => {
                    stats.dirty_via_include += 1
                }
                StaleState::Dirty => stats.changed += 1,
                StaleState::Missing => stats.missing += 1,
            }
        }
        for target in self.targets.values() {
            stats.deleted_objects += target.deleted_count();
            stats.missing_objects += target.missing_count();
            if target.is_dirty() {
                stats.forced_recompiles += 1;
            }
        }
        stats
    }
}
