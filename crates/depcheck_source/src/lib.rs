//! Source file access, include-line scanning, and declared source pool mapping.
//!
//! This crate provides the [`SourcePoolMapper`] that classifies absolute paths
//! into pool-relative logical paths, the [`TextIncludeScanner`] that recognizes
//! `#include` lines by a simple textual pattern, [`SourceFile`] for loading a
//! file with its content hash, and [`Location`] for pointing diagnostics at a
//! file and line.

#![warn(missing_docs)]

pub mod include;
pub mod location;
pub mod paths;
pub mod pool;
pub mod source_file;

pub use include::{
    IncludeDirective, IncludeKind, IncludeResolver, IncludeScanner, TextIncludeScanner,
};
pub use location::Location;
pub use pool::{PoolRoot, SourcePool, SourcePoolMapper};
pub use source_file::SourceFile;
