//! End-to-end behaviour of the checker, the index and the snapshot together.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use depcheck_common::Millis;
use depcheck_diagnostics::{DiagnosticCode, DiagnosticSink};
use depcheck_graph::{
    load_snapshot, write_snapshot, CheckOptions, Checker, DeleteMode, DependencyIndex, NodeId,
    ObjectLayout, ObjectTarget, RunStats, StaleState,
};
use depcheck_source::paths::canonical_path;
use depcheck_source::{IncludeResolver, SourcePoolMapper, TextIncludeScanner};
use proptest::prelude::*;

const BASE_MILLIS: u64 = 1_700_000_000_000;

/// A throwaway project: `src/`, `obj/`, optional `mirror/`, and a snapshot.
struct Project {
    _dir: tempfile::TempDir,
    root: PathBuf,
    mirror: bool,
}

impl Project {
    fn new(mirror: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = canonical_path(dir.path());
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("obj")).unwrap();
        Self {
            _dir: dir,
            root,
            mirror,
        }
    }

    fn src(&self, name: &str) -> PathBuf {
        self.root.join("src").join(name)
    }

    fn obj(&self, name: &str) -> PathBuf {
        self.root.join("obj").join(name)
    }

    fn snapshot_path(&self) -> PathBuf {
        self.root.join(".depcheck/deps.txt")
    }

    fn write(&self, name: &str, content: &str, offset_ms: u64) {
        let path = self.src(name);
        fs::write(&path, content).unwrap();
        set_mtime(&path, offset_ms);
    }

    /// One full run over `units`: load, check, write back.
    fn run(&self, units: &[&str]) -> (DependencyIndex, RunStats, DiagnosticSink) {
        let pool = SourcePoolMapper::new([(self.root.join("src"), None)]);
        let options = CheckOptions {
            mirror_dir: self.mirror.then(|| self.root.join("mirror")),
            objects: ObjectLayout::new(vec![self.root.join("obj")], "o"),
            delete_mode: DeleteMode::Delete,
        };
        let checker = Checker::new(
            &pool,
            &TextIncludeScanner,
            IncludeResolver::new(Vec::new()),
            options,
        );
        let mut index = match load_snapshot(&self.snapshot_path()).unwrap() {
            Some(snapshot) => DependencyIndex::from_snapshot(&snapshot),
            None => DependencyIndex::new(),
        };
        let sink = DiagnosticSink::new();
        for unit in units {
            checker.process_source_file(&mut index, &self.src(unit), &sink);
        }
        write_snapshot(&mut index, &self.snapshot_path(), self.mirror).unwrap();
        let stats = index.stats();
        (index, stats, sink)
    }
}

fn set_mtime(path: &Path, offset_ms: u64) {
    let time = UNIX_EPOCH + Duration::from_millis(BASE_MILLIS + offset_ms);
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

fn state_of(index: &DependencyIndex, path: &Path) -> StaleState {
    index.node(index.lookup(path).unwrap()).state()
}

#[test]
fn scenario_a_dirty_header_invalidates_includer_object() {
    let dir = tempfile::tempdir().unwrap();
    let obj = dir.path().join("b.o");
    fs::write(&obj, b"object").unwrap();

    let mut index = DependencyIndex::new();
    let sink = DiagnosticSink::new();
    let a_h = index.lookup_or_create(Path::new("/p/a.h"));
    let b_c = index.lookup_or_create(Path::new("/p/b.c"));
    index.attach_target(b_c, ObjectTarget::new("b.c", vec![obj.clone()]));

    index.notify_dirty(a_h, Millis::ZERO);
    let newly = index.add_dependency(b_c, a_h).newly_dirty;
    index.notify_targets(&newly, DeleteMode::Delete, &sink);

    assert_eq!(index.node(b_c).state(), StaleState::DirtyViaInclude);
    assert!(!obj.exists());
    assert_eq!(index.target(b_c).unwrap().deleted_count(), 1);
    assert_eq!(sink.diagnostics()[0].code, DiagnosticCode::OBJECT_DELETED);
}

#[test]
fn scenario_a_absent_object_is_flagged() {
    let mut index = DependencyIndex::new();
    let sink = DiagnosticSink::new();
    let a_h = index.lookup_or_create(Path::new("/p/a.h"));
    let b_c = index.lookup_or_create(Path::new("/p/b.c"));
    index.attach_target(
        b_c,
        ObjectTarget::new("b.c", vec![PathBuf::from("/nonexistent/obj/b.o")]),
    );

    index.notify_dirty(a_h, Millis::ZERO);
    let newly = index.add_dependency(b_c, a_h).newly_dirty;
    index.notify_targets(&newly, DeleteMode::Delete, &sink);

    assert_eq!(index.target(b_c).unwrap().missing_count(), 1);
    assert_eq!(index.stats().forced_recompiles, 1);
}

#[test]
fn scenario_b_propagates_through_chain() {
    let mut index = DependencyIndex::new();
    let b_c = index.lookup_or_create(Path::new("/p/b.c"));
    let a_h = index.lookup_or_create(Path::new("/p/a.h"));
    let base = index.lookup_or_create(Path::new("/p/base.h"));
    index.add_dependency(b_c, a_h);
    index.add_dependency(a_h, base);

    let newly = index.notify_dirty(base, Millis::ZERO);

    assert_eq!(newly, vec![base, a_h, b_c]);
    assert!(index.node(a_h).state().is_dirty_or_via_include());
    assert!(index.node(b_c).state().is_dirty_or_via_include());
    assert!(index.node(b_c).included_all().contains(&base));
}

#[test]
fn scenario_c_timestamp_shift_within_tolerance_keeps_object() {
    let project = Project::new(true);
    project.write("b.c", "int b;\n", 0);
    project.run(&["b.c"]);

    fs::write(project.obj("b.o"), b"object").unwrap();
    set_mtime(&project.src("b.c"), 2_400);
    let (index, stats, _) = project.run(&["b.c"]);

    assert_eq!(state_of(&index, &project.src("b.c")), StaleState::TimestampOnly);
    assert!(project.obj("b.o").exists());
    assert_eq!(stats.scanned, 0);
    assert_eq!(stats.deleted_objects, 0);
}

#[test]
fn untrusted_timestamp_with_identical_mirror_is_timestamp_only() {
    let project = Project::new(true);
    project.write("b.c", "int b;\n", 0);
    project.run(&["b.c"]);

    fs::write(project.obj("b.o"), b"object").unwrap();
    set_mtime(&project.src("b.c"), 60_000);
    let (index, stats, _) = project.run(&["b.c"]);

    assert_eq!(state_of(&index, &project.src("b.c")), StaleState::TimestampOnly);
    assert_eq!(stats.scanned, 1);
    assert!(project.obj("b.o").exists());
}

#[test]
fn content_change_deletes_object_and_refreshes_mirror() {
    let project = Project::new(true);
    project.write("b.c", "int b;\n", 0);
    project.run(&["b.c"]);
    assert_eq!(
        fs::read_to_string(project.root.join("mirror/b.c")).unwrap(),
        "int b;\n"
    );

    fs::write(project.obj("b.o"), b"object").unwrap();
    project.write("b.c", "int b = 2;\n", 60_000);
    let (index, stats, _) = project.run(&["b.c"]);

    assert_eq!(state_of(&index, &project.src("b.c")), StaleState::Dirty);
    assert!(!project.obj("b.o").exists());
    assert_eq!(stats.deleted_objects, 1);
    assert_eq!(
        fs::read_to_string(project.root.join("mirror/b.c")).unwrap(),
        "int b = 2;\n"
    );
}

#[test]
fn scenario_d_missing_include_keeps_edge() {
    let project = Project::new(false);
    project.write("b.c", "#include \"gone.h\"\n", 0);
    let (index, stats, sink) = project.run(&["b.c"]);

    let b = index.lookup(&project.src("b.c")).unwrap();
    let gone = index.lookup(&project.src("gone.h")).unwrap();
    assert_eq!(index.node(gone).state(), StaleState::Missing);
    assert!(index.node(b).included_primary().contains(&gone));
    assert!(index.node(gone).including_primary().contains(&b));
    assert!(index.target(gone).is_none());
    assert_eq!(stats.missing, 1);
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.code == DiagnosticCode::UNRESOLVED_INCLUDE));
}

#[test]
fn tolerance_boundary() {
    let project = Project::new(false);
    project.write("b.c", "int b;\n", 0);
    project.run(&["b.c"]);

    set_mtime(&project.src("b.c"), 2_499);
    let (index, _, _) = project.run(&["b.c"]);
    assert_eq!(state_of(&index, &project.src("b.c")), StaleState::TimestampOnly);

    set_mtime(&project.src("b.c"), 2_499 + 2_500);
    let (index, _, _) = project.run(&["b.c"]);
    assert_eq!(state_of(&index, &project.src("b.c")), StaleState::Dirty);
}

#[test]
fn unchanged_second_run_reuses_recorded_includes() {
    let project = Project::new(false);
    project.write("a.h", "int a;\n", 0);
    project.write("b.c", "#include \"a.h\"\n", 0);
    project.run(&["b.c"]);

    // Break the include line without touching the timestamp: a trusted file
    // is not rescanned, so the recorded edge survives.
    fs::write(project.src("b.c"), "// no includes\n").unwrap();
    set_mtime(&project.src("b.c"), 0);
    let (index, stats, _) = project.run(&["b.c"]);

    let b = index.lookup(&project.src("b.c")).unwrap();
    let a = index.lookup(&project.src("a.h")).unwrap();
    assert_eq!(index.node(b).state(), StaleState::Unchanged);
    assert!(index.node(b).included_primary().contains(&a));
    assert_eq!(stats.scanned, 0);
    assert_eq!(stats.unchanged, 2);
}

#[test]
fn edited_header_invalidates_every_includer() {
    let project = Project::new(false);
    project.write("common.h", "int c;\n", 0);
    project.write("a.h", "#include \"common.h\"\n", 0);
    project.write("one.c", "#include \"a.h\"\n", 0);
    project.write("two.c", "#include \"common.h\"\n", 0);
    project.run(&["one.c", "two.c"]);

    fs::write(project.obj("one.o"), b"1").unwrap();
    fs::write(project.obj("two.o"), b"2").unwrap();
    project.write("common.h", "int c = 1;\n", 10_000);
    let (index, stats, _) = project.run(&["one.c", "two.c"]);

    assert_eq!(state_of(&index, &project.src("common.h")), StaleState::Dirty);
    assert_eq!(state_of(&index, &project.src("a.h")), StaleState::DirtyViaInclude);
    assert!(!project.obj("one.o").exists());
    assert!(!project.obj("two.o").exists());
    assert_eq!(stats.forced_recompiles, 2);
    assert_eq!(stats.changed, 1);
}

#[test]
fn mutual_includes_keep_both_edges_and_report_cycle() {
    let project = Project::new(false);
    project.write("x.h", "#include \"y.h\"\n", 0);
    project.write("y.h", "#include \"x.h\"\n", 0);
    project.write("m.c", "#include \"x.h\"\n", 0);
    let (index, _, sink) = project.run(&["m.c"]);

    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.code == DiagnosticCode::INCLUDE_CYCLE));
    let x = index.lookup(&project.src("x.h")).unwrap();
    let y = index.lookup(&project.src("y.h")).unwrap();
    assert!(index.node(x).included_primary().contains(&y));
    assert!(index.node(y).included_primary().contains(&x));
    for (id, node) in index.iter() {
        assert!(!node.included_all().contains(&id));
    }

    let snapshot = load_snapshot(&project.snapshot_path()).unwrap().unwrap();
    let direct = |path: &Path| -> Vec<PathBuf> {
        snapshot
            .get(path)
            .unwrap()
            .direct_includes()
            .map(Path::to_path_buf)
            .collect()
    };
    assert_eq!(direct(&project.src("x.h")), vec![project.src("y.h")]);
    assert_eq!(direct(&project.src("y.h")), vec![project.src("x.h")]);
}

#[test]
fn edit_inside_include_cycle_reaches_outer_unit() {
    let project = Project::new(false);
    project.write("x.h", "#include \"y.h\"\nint x;\n", 0);
    project.write("y.h", "#include \"x.h\"\n", 0);
    project.write("b.c", "#include \"y.h\"\n", 0);
    project.run(&["b.c"]);

    fs::write(project.obj("b.o"), b"object").unwrap();
    project.write("x.h", "#include \"y.h\"\nint x = 1;\n", 60_000);
    let (index, stats, _) = project.run(&["b.c"]);

    assert_eq!(state_of(&index, &project.src("x.h")), StaleState::Dirty);
    assert_eq!(state_of(&index, &project.src("y.h")), StaleState::DirtyViaInclude);
    assert_eq!(state_of(&index, &project.src("b.c")), StaleState::DirtyViaInclude);
    assert!(!project.obj("b.o").exists());
    assert_eq!(stats.deleted_objects, 1);
}

#[test]
fn deleted_header_invalidates_includer_once() {
    let project = Project::new(false);
    project.write("a.h", "int a;\n", 0);
    project.write("b.c", "#include \"a.h\"\n", 0);
    project.run(&["b.c"]);

    fs::write(project.obj("b.o"), b"object").unwrap();
    fs::remove_file(project.src("a.h")).unwrap();
    let (index, stats, _) = project.run(&["b.c"]);

    assert_eq!(state_of(&index, &project.src("a.h")), StaleState::Missing);
    assert_eq!(state_of(&index, &project.src("b.c")), StaleState::DirtyViaInclude);
    assert!(!project.obj("b.o").exists());
    assert_eq!(stats.forced_recompiles, 1);

    // The header is now recorded as missing; a rebuilt object is left alone.
    fs::write(project.obj("b.o"), b"object").unwrap();
    let (index, stats, _) = project.run(&["b.c"]);
    assert_eq!(state_of(&index, &project.src("b.c")), StaleState::Unchanged);
    assert!(project.obj("b.o").exists());
    assert_eq!(stats.forced_recompiles, 0);
}

#[test]
fn snapshot_round_trip_reconstructs_graph() {
    let project = Project::new(true);
    project.write("base.h", "int base;\n", 0);
    project.write("a.h", "#include \"base.h\"\n", 0);
    project.write("b.c", "#include \"a.h\"\n#include \"gone.h\"\n", 0);
    let (index, _, _) = project.run(&["b.c"]);

    let snapshot = load_snapshot(&project.snapshot_path()).unwrap().unwrap();
    assert_eq!(snapshot.len(), index.stats().files);
    for id in index.processed_sorted() {
        let node = index.node(id);
        let record = snapshot.get(node.path()).unwrap();
        assert_eq!(record.state, Some(node.state()));
        assert_eq!(record.source_time, node.source_time());
        let recorded: BTreeSet<(PathBuf, bool)> = record
            .includes
            .iter()
            .map(|e| (e.path.clone(), e.direct))
            .collect();
        let live: BTreeSet<(PathBuf, bool)> = node
            .included_all()
            .iter()
            .map(|i| {
                (
                    index.node(*i).path().to_path_buf(),
                    node.included_primary().contains(i),
                )
            })
            .collect();
        assert_eq!(recorded, live);
        assert_eq!(record.included_in.len(), node.including_all().len());
    }
}

/// Files reachable from `from` through direct includes, `from` excluded.
fn reachable(index: &DependencyIndex, from: NodeId) -> BTreeSet<NodeId> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<NodeId> = index.node(from).included_primary().iter().copied().collect();
    while let Some(id) = stack.pop() {
        if seen.insert(id) {
            stack.extend(index.node(id).included_primary().iter().copied());
        }
    }
    seen.remove(&from);
    seen
}

proptest! {
    #[test]
    fn closure_matches_reachability(edges in prop::collection::vec((0usize..8, 0usize..8), 0..40)) {
        let mut index = DependencyIndex::new();
        let ids: Vec<NodeId> = (0..8)
            .map(|i| index.lookup_or_create(Path::new(&format!("/p/{i}.h"))))
            .collect();
        for (p, c) in edges {
            let link = index.add_dependency(ids[p], ids[c]);
            prop_assert_eq!(link.closes_cycle, reachable(&index, ids[c]).contains(&ids[p]) || p == c);
        }
        for &id in &ids {
            let node = index.node(id);
            let direct: BTreeSet<NodeId> = node.included_primary().iter().copied().filter(|&d| d != id).collect();
            prop_assert!(direct.is_subset(node.included_all()));
            prop_assert_eq!(node.included_all(), &reachable(&index, id));
            prop_assert!(!node.included_all().contains(&id));
            prop_assert!(!node.including_all().contains(&id));
            for inc in node.included_all() {
                prop_assert!(index.node(*inc).including_all().contains(&id));
            }
        }
    }
}
