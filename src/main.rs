//! ftrace-intervals CLI
//!
//! Parses ftrace/systrace text dumps and reports the intervals
//! reconstructed from them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use ftrace_intervals::commands::{
    display_kinds, display_version, events, execute_events, execute_intervals, execute_summary,
    intervals, EventsArgs, IntervalsArgs, SummaryArgs, TraceSource,
};
use ftrace_intervals::reconstruct::IntervalKind;

/// ftrace-intervals - interval reconstruction for kernel traces
#[derive(Parser, Debug)]
#[command(name = "ftrace-intervals")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Trace input shared by the trace-reading commands
#[derive(clap::Args, Debug)]
struct SourceOpts {
    /// Trace text file
    #[arg(short, long)]
    file: PathBuf,

    /// Record kinds to keep, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    kinds: Option<Vec<String>>,

    /// TOML ingestion config
    #[arg(long, env = "FTRACE_INTERVALS_CONFIG")]
    config: Option<PathBuf>,
}

impl From<SourceOpts> for TraceSource {
    fn from(opts: SourceOpts) -> Self {
        TraceSource {
            file: opts.file,
            kinds: opts.kinds,
            config: opts.config,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print header metadata and event counts
    Summary {
        #[command(flatten)]
        source: SourceOpts,

        /// Also reconstruct every applicable interval kind
        #[arg(long)]
        intervals: bool,

        /// Reconstruct components on parallel threads
        #[arg(long)]
        parallel: bool,
    },

    /// Query reconstructed intervals
    Intervals {
        #[command(flatten)]
        source: SourceOpts,

        /// Interval kind (see `kinds`)
        #[arg(long)]
        kind: IntervalKind,

        /// One key: section name, cpu number, clock name, ...
        #[arg(long)]
        key: Option<String>,

        /// Only intervals whose name contains this text
        #[arg(long)]
        matching: Option<String>,

        /// Merge all keys into one timeline
        #[arg(long)]
        merged: bool,

        /// Range start, seconds since the first record
        #[arg(long)]
        start: Option<f64>,

        /// Range end, seconds since the first record
        #[arg(long)]
        end: Option<f64>,

        /// Keep whole records instead of clipping them to the range
        #[arg(long)]
        untrimmed: bool,

        /// Output path for JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Rows to print
        #[arg(long, default_value = "50")]
        max_lines: usize,
    },

    /// Query raw events
    Events {
        #[command(flatten)]
        source: SourceOpts,

        /// Record kind, e.g. sched_switch
        #[arg(long)]
        kind: Option<String>,

        /// Only events logged by this pid
        #[arg(long)]
        pid: Option<u32>,

        #[arg(long)]
        start: Option<f64>,

        #[arg(long)]
        end: Option<f64>,

        /// Output path for JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rows to print
        #[arg(long, default_value = "50")]
        max_lines: usize,
    },

    /// List interval kinds and the record kinds they need
    Kinds,

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Summary {
            source,
            intervals,
            parallel,
        } => {
            execute_summary(SummaryArgs {
                source: source.into(),
                intervals,
                parallel,
            })?;
        }

        Commands::Intervals {
            source,
            kind,
            key,
            matching,
            merged,
            start,
            end,
            untrimmed,
            output,
            compact,
            max_lines,
        } => {
            let args = IntervalsArgs {
                source: source.into(),
                kind,
                key,
                matching,
                merged,
                start,
                end,
                untrimmed,
                output,
                compact,
                max_lines,
            };

            // Validate args first
            intervals::validate_args(&args)?;
            execute_intervals(args)?;
        }

        Commands::Events {
            source,
            kind,
            pid,
            start,
            end,
            output,
            max_lines,
        } => {
            let args = EventsArgs {
                source: source.into(),
                kind,
                pid,
                start,
                end,
                output,
                max_lines,
            };

            events::validate_args(&args)?;
            execute_events(args)?;
        }

        Commands::Kinds => {
            display_kinds()?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
