//! Snapshot parsing, including the older depth-prefixed layout.

use std::fs;
use std::io;
use std::iter::{Enumerate, Peekable};
use std::path::{Path, PathBuf};
use std::str::Lines;

use depcheck_common::Millis;

use super::{IncludeEntry, IncluderEntry, Snapshot, SnapshotRecord};
use crate::error::GraphError;
use crate::state::StaleState;

/// Deepest nesting level accepted in the legacy layout.
pub const MAX_LEGACY_DEPTH: usize = 48;

pub(super) const FILE_PREFIX: &str = "File: ";
pub(super) const INCLUDES_HEADER: &str = "  .includes:";
pub(super) const INCLUDED_IN_HEADER: &str = "  .is included in:";
const ENTRY_INDENT: &str = "   ";
const LEGACY_SENTINEL: &str = "...";

/// Reads the snapshot at `path`.
///
/// A missing file is a first run and yields `Ok(None)`.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, GraphError> {
    match fs::read_to_string(path) {
        Ok(text) => parse_snapshot(&text, path).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(GraphError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parses snapshot text. `path` is only used in error messages.
pub fn parse_snapshot(text: &str, path: &Path) -> Result<Snapshot, GraphError> {
    SnapshotReader::new(text, path).read()
}

#[derive(Clone, Copy)]
enum Section {
    Includes,
    IncludedIn,
}

enum BodyLine<'a> {
    IncludesHeader,
    IncludedInHeader,
    Entry(&'a str),
    Legacy {
        depth: usize,
        repeat: bool,
        record: &'a str,
    },
}

/// One step through a record's body. The end of the body is an explicit
/// value so it cannot be mistaken for a parse failure.
enum Step<'a> {
    Line(usize, BodyLine<'a>),
    EndOfRecord,
}

struct SnapshotReader<'a> {
    path: &'a Path,
    lines: Peekable<Enumerate<Lines<'a>>>,
    snapshot: Snapshot,
    legacy_records: Vec<SnapshotRecord>,
    legacy_edges: Vec<(PathBuf, PathBuf)>,
}

impl<'a> SnapshotReader<'a> {
    fn new(text: &'a str, path: &'a Path) -> Self {
        Self {
            path,
            lines: text.lines().enumerate().peekable(),
            snapshot: Snapshot::new(),
            legacy_records: Vec::new(),
            legacy_edges: Vec::new(),
        }
    }

    fn read(mut self) -> Result<Snapshot, GraphError> {
        while let Some((n, line)) = self.peek_significant() {
            self.lines.next();
            let text = line
                .strip_prefix(FILE_PREFIX)
                .ok_or_else(|| self.error(n, "expected `File: `"))?;
            let mut record = parse_record(text).map_err(|reason| self.error(n, reason))?;
            self.read_body(&mut record)?;
            self.snapshot.insert(record);
        }

        for record in std::mem::take(&mut self.legacy_records) {
            if self.snapshot.get(&record.source_path).is_none() {
                self.snapshot.insert(record);
            }
        }
        for (parent, child) in std::mem::take(&mut self.legacy_edges) {
            let record = self.snapshot.get_or_insert(&parent);
            if !record.includes.iter().any(|e| e.path == child) {
                record.includes.push(IncludeEntry {
                    path: child,
                    direct: true,
                    state: StaleState::Unchanged,
                });
            }
        }
        Ok(self.snapshot)
    }

    fn read_body(&mut self, record: &mut SnapshotRecord) -> Result<(), GraphError> {
        let mut section = None;
        let mut ancestors = vec![record.source_path.clone()];
        loop {
            let (n, line) = match self.next_body_line()? {
                Step::EndOfRecord => return Ok(()),
                Step::Line(n, line) => (n, line),
            };
            match line {
                BodyLine::IncludesHeader => section = Some(Section::Includes),
                BodyLine::IncludedInHeader => section = Some(Section::IncludedIn),
                BodyLine::Entry(text) => match section {
                    Some(Section::Includes) => {
                        let entry = parse_include_entry(text).map_err(|r| self.error(n, r))?;
                        record.includes.push(entry);
                    }
                    Some(Section::IncludedIn) => {
                        let entry = parse_includer_entry(text).map_err(|r| self.error(n, r))?;
                        record.included_in.push(entry);
                    }
                    None => return Err(self.error(n, "entry outside of a section")),
                },
                BodyLine::Legacy {
                    depth,
                    repeat,
                    record: text,
                } => self.legacy_line(n, depth, repeat, text, &mut ancestors)?,
            }
        }
    }

    /// Handles `<depth>; <record>` and `+<depth>; <record>`.
    ///
    /// `ancestors[d]` is the most recent file seen at depth `d`; depth zero is
    /// the enclosing `File:` record.
    fn legacy_line(
        &mut self,
        n: usize,
        depth: usize,
        repeat: bool,
        text: &str,
        ancestors: &mut Vec<PathBuf>,
    ) -> Result<(), GraphError> {
        if depth == 0 || depth > MAX_LEGACY_DEPTH {
            return Err(self.error(
                n,
                format!("legacy depth {depth} outside 1..={MAX_LEGACY_DEPTH}"),
            ));
        }
        let text = text.trim_start();
        if text == LEGACY_SENTINEL {
            return Ok(());
        }
        if depth > ancestors.len() {
            return Err(self.error(n, format!("legacy depth {depth} has no parent")));
        }
        ancestors.truncate(depth);
        let parent = ancestors[depth - 1].clone();
        let record = parse_record(text).map_err(|r| self.error(n, r))?;
        let child = record.source_path.clone();
        self.legacy_edges.push((parent, child.clone()));
        ancestors.push(child);
        if !repeat {
            self.legacy_records.push(record);
        }
        Ok(())
    }

    /// Skips blank and comment lines, then returns the next line unconsumed.
    fn peek_significant(&mut self) -> Option<(usize, &'a str)> {
        while let Some(&(n, raw)) = self.lines.peek() {
            let line = raw.trim_end_matches('\r');
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.lines.next();
                continue;
            }
            return Some((n, line));
        }
        None
    }

    fn next_body_line(&mut self) -> Result<Step<'a>, GraphError> {
        let Some((n, line)) = self.peek_significant() else {
            return Ok(Step::EndOfRecord);
        };
        if line.starts_with(FILE_PREFIX) {
            return Ok(Step::EndOfRecord);
        }
        self.lines.next();

        let body = if line.trim_end() == INCLUDES_HEADER {
            BodyLine::IncludesHeader
        } else if line.trim_end() == INCLUDED_IN_HEADER {
            BodyLine::IncludedInHeader
        } else if let Some((repeat, depth, record)) = parse_legacy_prefix(line) {
            BodyLine::Legacy {
                depth,
                repeat,
                record,
            }
        } else if let Some(entry) = line.strip_prefix(ENTRY_INDENT) {
            BodyLine::Entry(entry)
        } else {
            return Err(self.error(n, "expected `File: `"));
        };
        Ok(Step::Line(n, body))
    }

    fn error(&self, index: usize, reason: impl Into<String>) -> GraphError {
        GraphError::SnapshotFormat {
            path: self.path.to_path_buf(),
            line: index + 1,
            reason: reason.into(),
        }
    }
}

/// Splits a record into its fields.
pub(super) fn parse_record(text: &str) -> Result<SnapshotRecord, String> {
    let fields: Vec<&str> = text.split("; ").collect();
    match fields.as_slice() {
        [_date, millis, path] => Ok(SnapshotRecord::new(
            PathBuf::from(*path),
            parse_millis(millis)?,
        )),
        [_mirror_date, mirror_millis, mirror_path, state, path, millis, _date] => {
            let mut record = SnapshotRecord::new(PathBuf::from(*path), parse_millis(millis)?);
            record.mirror_time = parse_millis(mirror_millis)?;
            record.mirror_path = (*mirror_path != "-").then(|| PathBuf::from(*mirror_path));
            record.state = Some(parse_state(state)?);
            Ok(record)
        }
        _ => Err(format!(
            "expected 3 or 7 `; `-separated fields, found {}",
            fields.len()
        )),
    }
}

fn parse_millis(text: &str) -> Result<Millis, String> {
    match text.parse::<i64>() {
        Ok(millis) if millis >= 0 => Ok(Millis::from_raw(millis)),
        Ok(_) => Err(format!("negative timestamp `{text}`")),
        Err(_) => Err(format!("invalid timestamp `{text}`")),
    }
}

fn parse_state(text: &str) -> Result<StaleState, String> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            StaleState::from_char(c).ok_or_else(|| format!("unknown state `{c}`"))
        }
        _ => Err(format!("invalid state field `{text}`")),
    }
}

/// Parses `<state><-|+> <path>`.
fn parse_include_entry(text: &str) -> Result<IncludeEntry, String> {
    let mut chars = text.chars();
    let state = chars
        .next()
        .and_then(StaleState::from_char)
        .ok_or_else(|| format!("bad include entry `{text}`"))?;
    let direct = match chars.next() {
        Some('-') => true,
        Some('+') => false,
        _ => return Err(format!("bad include entry `{text}`")),
    };
    let path = chars
        .as_str()
        .strip_prefix(' ')
        .filter(|p| !p.is_empty())
        .ok_or_else(|| format!("bad include entry `{text}`"))?;
    Ok(IncludeEntry {
        path: PathBuf::from(path),
        direct,
        state,
    })
}

/// Parses `<*|%> <path>`.
fn parse_includer_entry(text: &str) -> Result<IncluderEntry, String> {
    let (direct, rest) = if let Some(rest) = text.strip_prefix('*') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('%') {
        (false, rest)
    } else {
        return Err(format!("bad includer entry `{text}`"));
    };
    let path = rest
        .strip_prefix(' ')
        .filter(|p| !p.is_empty())
        .ok_or_else(|| format!("bad includer entry `{text}`"))?;
    Ok(IncluderEntry {
        path: PathBuf::from(path),
        direct,
    })
}

fn parse_legacy_prefix(line: &str) -> Option<(bool, usize, &str)> {
    let (repeat, rest) = match line.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let depth = rest[..digits].parse().ok()?;
    let record = rest[digits..].strip_prefix("; ")?;
    Some((repeat, depth, record))
}
