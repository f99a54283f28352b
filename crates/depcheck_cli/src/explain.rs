//! `depcheck explain`: shows what the last snapshot recorded about one file.

use std::path::{Path, PathBuf};

use depcheck_config::resolve_config;
use depcheck_graph::{load_snapshot, SnapshotRecord};
use depcheck_source::paths::canonical_path;

use crate::pipeline::resolve_project_root;
use crate::{ExplainArgs, GlobalArgs};

/// Runs the `depcheck explain` command.
pub fn run(args: &ExplainArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = depcheck_config::load_config(&project_dir)?;
    let resolved = resolve_config(&config, &project_dir);

    let snapshot = load_snapshot(&resolved.snapshot_path)?.ok_or_else(|| {
        format!(
            "no snapshot at {}; run `depcheck check` first",
            resolved.snapshot_path.display()
        )
    })?;

    let file = canonical_path(&absolute(Path::new(&args.file))?);
    let record = snapshot
        .get(&file)
        .ok_or_else(|| format!("{} is not recorded in the snapshot", file.display()))?;

    print!("{}", format_record(record));
    Ok(0)
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Renders a record as an indented report.
fn format_record(record: &SnapshotRecord) -> String {
    let mut out = format!("{}\n", record.source_path.display());
    out.push_str(&format!(
        "  modified: {} ({} ms)\n",
        record.source_time.format_date(),
        record.source_time
    ));
    if let Some(state) = record.state {
        out.push_str(&format!("  state:    {state}\n"));
    }
    if let Some(mirror) = &record.mirror_path {
        out.push_str(&format!(
            "  mirror:   {} ({} ms)\n",
            mirror.display(),
            record.mirror_time
        ));
    }

    out.push_str(&format!("  includes ({}):\n", record.includes.len()));
    for entry in &record.includes {
        let how = if entry.direct { "direct" } else { "via" };
        out.push_str(&format!(
            "    {how:<6} {} [{}]\n",
            entry.path.display(),
            entry.state
        ));
    }
    out.push_str(&format!("  included by ({}):\n", record.included_in.len()));
    for entry in &record.included_in {
        let how = if entry.direct { "direct" } else { "via" };
        out.push_str(&format!("    {how:<6} {}\n", entry.path.display()));
    }
    out
}
