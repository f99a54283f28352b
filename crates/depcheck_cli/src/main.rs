//! depcheck CLI: incremental-build staleness checking for C and C++ trees.
//!
//! Provides `depcheck check`, which compares every compilation unit and the
//! headers it includes against the previous run's dependency snapshot and
//! deletes the objects that must be rebuilt, and `depcheck explain`, which
//! prints what the snapshot recorded about a single file.

#![warn(missing_docs)]

mod check;
mod explain;
mod pipeline;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "DEPCHECK_LOG";

/// depcheck: find and delete stale object files before a build.
#[derive(Parser, Debug)]
#[command(name = "depcheck", version, about = "Include-aware incremental build checker")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `depcheck.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check every compilation unit and delete stale objects.
    Check(CheckArgs),
    /// Show the recorded includes and includers of a file.
    Explain(ExplainArgs),
}

/// Arguments for the `depcheck check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Report what would be deleted without deleting or writing the snapshot.
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for the report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `depcheck explain` subcommand.
#[derive(Parser, Debug)]
pub struct ExplainArgs {
    /// The source file or header to explain.
    pub file: String,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Check(ref args) => check::run(args, &global),
        Command::Explain(ref args) => explain::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber.
///
/// `DEPCHECK_LOG` takes a standard filter directive and wins over the flags.
fn init_tracing(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(global)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_ansi(global.color)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn default_filter(global: &GlobalArgs) -> &'static str {
    if global.verbose {
        "depcheck=debug,info"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    }
}
