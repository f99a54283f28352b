//! Shared foundational types used across the depcheck workspace.
//!
//! This crate provides content hashing for mirror comparison, epoch-millisecond
//! timestamps with the staleness tolerance, and the canonical-path interner that
//! backs dependency node lookup.

#![warn(missing_docs)]

pub mod hash;
pub mod path_key;
pub mod timestamp;

pub use hash::ContentHash;
pub use path_key::{PathInterner, PathKey};
pub use timestamp::{Freshness, Millis, TIMESTAMP_TOLERANCE_MS};
