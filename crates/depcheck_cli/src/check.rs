//! `depcheck check`: the incremental staleness pass.
//!
//! 1. Find the project root and load `depcheck.toml`
//! 2. Resolve configured paths, warning about missing directories
//! 3. Load the previous snapshot (absent on a first run)
//! 4. Discover compilation units in every source root
//! 5. Check each unit, deleting objects of stale ones
//! 6. Write the new snapshot (skipped in a dry run)
//! 7. Report statistics and diagnostics

use depcheck_config::{resolve_config, ResolvedConfig};
use depcheck_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use depcheck_graph::{
    load_snapshot, write_snapshot, CheckOptions, Checker, DeleteMode, DependencyIndex,
    ObjectLayout, RunStats,
};
use depcheck_source::{IncludeResolver, Location, SourcePoolMapper, TextIncludeScanner};
use serde::Serialize;

use crate::pipeline::{discover_source_files, render_diagnostics, resolve_project_root};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Machine-readable result of a run.
#[derive(Serialize)]
struct CheckReport<'a> {
    project: &'a str,
    dry_run: bool,
    stats: &'a RunStats,
    diagnostics: Vec<Diagnostic>,
}

/// Runs the `depcheck check` command.
///
/// Fatal problems (unreadable configuration, malformed snapshot, failure to
/// write the snapshot) are returned as errors. Everything else is reported
/// and the exit code is 0.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = depcheck_config::load_config(&project_dir)?;
    let text = args.format == ReportFormat::Text;

    if !global.quiet && text {
        eprintln!("   Checking {}", config.project.name);
    }

    let resolved = resolve_config(&config, &project_dir);
    let sink = DiagnosticSink::new();
    report_unresolved(&resolved, &sink);

    let pool = SourcePoolMapper::new(resolved.source_roots.iter().cloned());
    let mut index = match load_snapshot(&resolved.snapshot_path)? {
        Some(snapshot) => {
            tracing::debug!(records = snapshot.len(), "previous snapshot loaded");
            DependencyIndex::from_snapshot(&snapshot)
        }
        None => {
            tracing::info!(path = %resolved.snapshot_path.display(), "no previous snapshot, first run");
            DependencyIndex::new()
        }
    };

    let delete_mode = if args.dry_run {
        DeleteMode::DryRun
    } else {
        DeleteMode::Delete
    };
    let options = CheckOptions {
        mirror_dir: resolved.mirror_dir.clone(),
        objects: ObjectLayout::new(
            resolved.object_dirs.clone(),
            resolved.object_extension.clone(),
        ),
        delete_mode,
    };
    let scanner = TextIncludeScanner;
    let checker = Checker::new(
        &pool,
        &scanner,
        IncludeResolver::new(resolved.include_paths.clone()),
        options,
    );

    let mut units = Vec::new();
    for root in pool.roots() {
        units.extend(discover_source_files(&root.dir, &resolved.extensions)?);
    }
    units.sort();
    units.dedup();
    tracing::debug!(count = units.len(), "compilation units discovered");

    for unit in &units {
        checker.process_source_file(&mut index, unit, &sink);
    }

    if args.dry_run {
        tracing::info!("dry run, snapshot not written");
    } else {
        write_snapshot(
            &mut index,
            &resolved.snapshot_path,
            resolved.mirror_dir.is_some(),
        )?;
    }

    let stats = index.stats();
    match args.format {
        ReportFormat::Text => {
            render_diagnostics(&sink, global.color, global.quiet);
            if !global.quiet {
                eprintln!("{}", format_summary(&stats, args.dry_run));
            }
        }
        ReportFormat::Json => {
            let report = CheckReport {
                project: &config.project.name,
                dry_run: args.dry_run,
                stats: &stats,
                diagnostics: sink.take_all(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(0)
}

fn report_unresolved(resolved: &ResolvedConfig, sink: &DiagnosticSink) {
    for unresolved in &resolved.unresolved {
        sink.emit(
            Diagnostic::warning(
                DiagnosticCode::UNRESOLVED_CONFIG_PATH,
                format!("configured directory not found, skipping (`{}`)", unresolved.key),
            )
            .at(Location::file(unresolved.path.clone())),
        );
    }
}

/// The human-readable end-of-run summary.
fn format_summary(stats: &RunStats, dry_run: bool) -> String {
    let deleted = if dry_run { "would delete" } else { "deleted" };
    format!(
        "   Files: {} ({} scanned, {} new)\n   \
         Changed: {}, via include: {}, timestamp only: {}, missing: {}, unchanged: {}\n   \
         Objects: {} {}, {} already missing, {} source(s) to recompile",
        stats.files,
        stats.scanned,
        stats.new_files,
        stats.changed,
        stats.dirty_via_include,
        stats.timestamp_only,
        stats.missing,
        stats.unchanged,
        deleted,
        stats.deleted_objects,
        stats.missing_objects,
        stats.forced_recompiles,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[project]
name = "demo"

[[sources]]
dir = "src"

[includes]
paths = ["include", "missing_dir"]

[objects]
dirs = ["build"]
"#;

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("depcheck.toml"), CONFIG).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("include")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("include/api.h"), "int api(void);\n").unwrap();
        fs::write(root.join("src/main.c"), "#include <api.h>\nint main(void) { return api(); }\n").unwrap();
        fs::write(root.join("build/main.o"), b"obj").unwrap();
        tmp
    }

    fn global(root: &Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(root.to_string_lossy().into_owned()),
        }
    }

    fn args(dry_run: bool) -> CheckArgs {
        CheckArgs {
            dry_run,
            format: ReportFormat::Text,
        }
    }

    #[test]
    fn first_run_writes_snapshot_and_deletes_object() {
        let tmp = project();
        let code = run(&args(false), &global(tmp.path())).unwrap();
        assert_eq!(code, 0);
        assert!(tmp.path().join(".depcheck/deps.txt").is_file());
        assert!(!tmp.path().join("build/main.o").exists());
    }

    #[test]
    fn dry_run_leaves_files_alone() {
        let tmp = project();
        run(&args(true), &global(tmp.path())).unwrap();
        assert!(!tmp.path().join(".depcheck/deps.txt").exists());
        assert!(tmp.path().join("build/main.o").exists());
    }

    #[test]
    fn second_run_keeps_object() {
        let tmp = project();
        run(&args(false), &global(tmp.path())).unwrap();
        fs::write(tmp.path().join("build/main.o"), b"rebuilt").unwrap();
        run(&args(false), &global(tmp.path())).unwrap();
        assert!(tmp.path().join("build/main.o").exists());
    }

    #[test]
    fn malformed_snapshot_is_fatal() {
        let tmp = project();
        fs::create_dir_all(tmp.path().join(".depcheck")).unwrap();
        fs::write(tmp.path().join(".depcheck/deps.txt"), "not a snapshot\n").unwrap();
        let err = run(&args(false), &global(tmp.path())).unwrap_err();
        assert!(err.to_string().contains("malformed snapshot"));
        assert!(tmp.path().join("build/main.o").exists());
    }

    #[test]
    fn summary_mentions_dry_run() {
        let stats = RunStats {
            files: 3,
            deleted_objects: 2,
            ..RunStats::default()
        };
        assert!(format_summary(&stats, true).contains("would delete 2"));
        assert!(format_summary(&stats, false).contains("deleted 2"));
    }
}
