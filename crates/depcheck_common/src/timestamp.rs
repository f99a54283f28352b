//! Epoch-millisecond timestamps and the tolerance used to compare them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Slack applied when comparing a file's modification time with the one
/// recorded in the snapshot. Covers coarse file-system granularity (FAT, SMB)
/// and clock skew between build hosts.
pub const TIMESTAMP_TOLERANCE_MS: i64 = 2500;

/// A point in time as milliseconds since the Unix epoch.
///
/// `Millis::ZERO` stands for "absent" (no mirror file, never recorded).
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Millis(i64);

impl Millis {
    /// The absent timestamp.
    pub const ZERO: Millis = Millis(0);

    /// Creates a timestamp from raw epoch milliseconds.
    pub fn from_raw(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the raw epoch milliseconds.
    pub fn as_raw(self) -> i64 {
        self.0
    }

    /// Returns `true` if this is the absent timestamp.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Converts a [`SystemTime`], clamping pre-epoch times to zero.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self(i64::try_from(d.as_millis()).unwrap_or(i64::MAX)),
            Err(_) => Self::ZERO,
        }
    }

    /// Returns the modification time of the file at `path`.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Self::from_system_time(modified))
    }

    /// Returns the modification time of `path`, or [`Millis::ZERO`] if the
    /// file cannot be inspected.
    pub fn of_file_or_zero(path: &Path) -> Self {
        Self::of_file(path).unwrap_or(Self::ZERO)
    }

    /// Absolute distance between two timestamps in milliseconds.
    pub fn distance(self, other: Millis) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Renders the timestamp as a UTC date, e.g. `2024-03-01 12:30:05.250`.
    ///
    /// The date is informational only; readers use the raw milliseconds.
    pub fn format_date(self) -> String {
        match DateTime::<Utc>::from_timestamp_millis(self.0) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            None => "-".to_string(),
        }
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How far an observed timestamp is from the recorded one.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Freshness {
    /// Identical to the recorded value.
    Exact,
    /// Differs, but by less than [`TIMESTAMP_TOLERANCE_MS`].
    WithinTolerance,
    /// Differs by the tolerance or more; the recorded data cannot be trusted.
    Untrusted,
}

impl Freshness {
    /// Classifies `actual` against `recorded`.
    pub fn compare(actual: Millis, recorded: Millis) -> Self {
        let distance = actual.distance(recorded);
        if distance == 0 {
            Freshness::Exact
        } else if distance < TIMESTAMP_TOLERANCE_MS.unsigned_abs() {
            Freshness::WithinTolerance
        } else {
            Freshness::Untrusted
        }
    }

    /// Combines two observations; the least trusted one wins.
    pub fn and(self, other: Freshness) -> Freshness {
        match (self, other) {
            (Freshness::Untrusted, _) | (_, Freshness::Untrusted) => Freshness::Untrusted,
            (Freshness::WithinTolerance, _) | (_, Freshness::WithinTolerance) => {
                Freshness::WithinTolerance
            }
            _ => Freshness::Exact,
        }
    }

    /// Returns `true` unless the timestamps are untrusted.
    pub fn is_trusted(self) -> bool {
        self != Freshness::Untrusted
    }
}
