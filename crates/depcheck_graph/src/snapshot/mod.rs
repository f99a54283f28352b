//! The dependency snapshot: what the previous run learned about every file.
//!
//! The snapshot is a plain text file, one block per file:
//!
//! ```text
//! File: <record>
//!   .includes:
//!    <state>- /abs/direct/include.h
//!    <state>+ /abs/indirect/include.h
//!   .is included in:
//!    * /abs/direct/includer.c
//!    % /abs/indirect/includer.c
//! ```
//!
//! A record is `<date>; <millis>; <path>` without a mirror tree, or
//! `<mirror date>; <mirror millis>; <mirror path>; <state>; <path>; <millis>; <date>`
//! with one. Dates are informational; the millisecond values are compared.

mod reader;
mod writer;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use depcheck_common::Millis;

use crate::state::StaleState;

pub use reader::{load_snapshot, parse_snapshot, MAX_LEGACY_DEPTH};
pub use writer::{render_snapshot, write_snapshot};

/// One include listed under a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeEntry {
    /// Canonical path of the included file.
    pub path: PathBuf,
    /// Included directly rather than through another header.
    pub direct: bool,
    /// State of the included file when the snapshot was written.
    pub state: StaleState,
}

/// One includer listed under a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncluderEntry {
    /// Canonical path of the including file.
    pub path: PathBuf,
    /// Includes the record's file directly.
    pub direct: bool,
}

/// Everything recorded about one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotRecord {
    /// Canonical path of the file.
    pub source_path: PathBuf,
    /// Source modification time.
    pub source_time: Millis,
    /// Mirror copy location, when the file had one.
    pub mirror_path: Option<PathBuf>,
    /// Mirror modification time, zero without a mirror.
    pub mirror_time: Millis,
    /// State at write time; only the mirror form records it.
    pub state: Option<StaleState>,
    /// Direct and indirect includes.
    pub includes: Vec<IncludeEntry>,
    /// Direct and indirect includers.
    pub included_in: Vec<IncluderEntry>,
}

impl SnapshotRecord {
    /// A record carrying only a path and source time.
    pub fn new(source_path: PathBuf, source_time: Millis) -> Self {
        Self {
            source_path,
            source_time,
            mirror_path: None,
            mirror_time: Millis::ZERO,
            state: None,
            includes: Vec::new(),
            included_in: Vec::new(),
        }
    }

    /// Paths of the files this one includes directly.
    pub fn direct_includes(&self) -> impl Iterator<Item = &Path> {
        self.includes
            .iter()
            .filter(|e| e.direct)
            .map(|e| e.path.as_path())
    }
}

/// A parsed snapshot, keyed by file path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: BTreeMap<PathBuf, SnapshotRecord>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the record for its path.
    pub fn insert(&mut self, record: SnapshotRecord) {
        self.records.insert(record.source_path.clone(), record);
    }

    /// The record for `path`.
    pub fn get(&self, path: &Path) -> Option<&SnapshotRecord> {
        self.records.get(path)
    }

    pub(crate) fn get_or_insert(&mut self, path: &Path) -> &mut SnapshotRecord {
        self.records
            .entry(path.to_path_buf())
            .or_insert_with(|| SnapshotRecord::new(path.to_path_buf(), Millis::ZERO))
    }

    /// All records, sorted by path.
    pub fn records(&self) -> impl Iterator<Item = &SnapshotRecord> {
        self.records.values()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
