//! Snapshot serialization.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use depcheck_source::paths::normalized;

use super::reader::{FILE_PREFIX, INCLUDED_IN_HEADER, INCLUDES_HEADER};
use crate::error::GraphError;
use crate::index::DependencyIndex;
use crate::node::NodeId;

const HEADER: &str = "# depcheck dependency snapshot\n";

/// Renders every node processed this run, sorted by path.
///
/// `with_mirror` selects the seven-field record form.
pub fn render_snapshot(index: &mut DependencyIndex, with_mirror: bool) -> String {
    let mut out = String::from(HEADER);
    for id in index.processed_sorted() {
        let record = index.node_mut(id).record_line(with_mirror).to_string();
        out.push_str(FILE_PREFIX);
        out.push_str(&record);
        out.push('\n');

        let node = index.node(id);
        out.push_str(INCLUDES_HEADER);
        out.push('\n');
        for inc in sorted_by_path(index, node.included_all()) {
            let sign = if node.included_primary().contains(&inc) {
                '-'
            } else {
                '+'
            };
            let included = index.node(inc);
            out.push_str(&format!(
                "   {}{} {}\n",
                included.state().as_char(),
                sign,
                normalized(included.path())
            ));
        }

        out.push_str(INCLUDED_IN_HEADER);
        out.push('\n');
        for inc in sorted_by_path(index, node.including_all()) {
            let mark = if node.including_primary().contains(&inc) {
                '*'
            } else {
                '%'
            };
            out.push_str(&format!("   {} {}\n", mark, normalized(index.node(inc).path())));
        }
    }
    out
}

/// Writes the snapshot to `path`, replacing any previous one atomically.
///
/// The text goes to a temporary file in the same directory first, so a
/// failure leaves the old snapshot intact.
pub fn write_snapshot(
    index: &mut DependencyIndex,
    path: &Path,
    with_mirror: bool,
) -> Result<(), GraphError> {
    let text = render_snapshot(index, with_mirror);
    let io_error = |source: std::io::Error| GraphError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_error)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    tmp.write_all(text.as_bytes()).map_err(io_error)?;
    tmp.persist(path).map_err(|e| io_error(e.error))?;

    tracing::debug!(path = %path.display(), bytes = text.len(), "snapshot written");
    Ok(())
}

fn sorted_by_path(index: &DependencyIndex, ids: &BTreeSet<NodeId>) -> Vec<NodeId> {
    let mut ids: Vec<NodeId> = ids.iter().copied().collect();
    ids.sort_by(|a, b| index.node(*a).path().cmp(index.node(*b).path()));
    ids
}
