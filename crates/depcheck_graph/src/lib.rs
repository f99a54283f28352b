//! Include-graph staleness tracking for incremental builds.
//!
//! This crate holds the per-run [`DependencyIndex`] of files and their include
//! relations, the [`StaleState`] machine, the [`ObjectTarget`]s whose stale
//! artifacts get deleted, the plain-text dependency snapshot carried from one
//! run to the next, and the [`Checker`] that ties them together.

#![warn(missing_docs)]

pub mod checker;
pub mod error;
pub mod index;
pub mod node;
pub mod object;
pub mod snapshot;
pub mod state;

pub use checker::{CheckOptions, Checker};
pub use error::GraphError;
pub use index::{DependencyIndex, Link, RunStats};
pub use node::{DependencyNode, NodeId, Recorded};
pub use object::{DeleteMode, DeletionState, ObjectLayout, ObjectTarget};
pub use snapshot::{
    load_snapshot, parse_snapshot, render_snapshot, write_snapshot, IncludeEntry, IncluderEntry,
    Snapshot, SnapshotRecord,
};
pub use state::{StaleEvent, StaleState};
