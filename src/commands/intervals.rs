//! Intervals command implementation.
//!
//! The intervals command:
//! 1. Parses the trace
//! 2. Reconstructs the requested interval kind
//! 3. Prints the result or writes it as a JSON report

use super::models::IntervalsArgs;
use super::utils::{load_session, resolve_window, validate_source, validate_window};
use crate::output::{format_intervals, write_report, write_report_compact, IntervalReport, TraceSummary};
use crate::session::TraceSession;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the intervals command
///
/// **Public** - main entry point called from main.rs
///
/// Without `--key` or `--merged`, prints the keys of the kind with their
/// record counts instead of the records themselves.
///
/// # Errors
/// * Trace parsing failures
/// * The trace lacks the record kinds the interval kind needs
/// * File write errors
pub fn execute_intervals(args: IntervalsArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/3: Parsing trace...");
    let (session, _) = load_session(&args.source)?;
    let window = resolve_window(&session, args.start, args.end)?;
    let trimmed = !args.untrimmed;

    if args.key.is_none() && !args.merged && args.matching.is_none() && args.output.is_none() {
        info!("Step 2/3: Listing {} keys...", args.kind);
        print_keys(&session, &args)?;
        return Ok(());
    }

    info!("Step 2/3: Reconstructing {} intervals...", args.kind);
    let store = match &args.matching {
        Some(pattern) => session
            .intervals_matching(args.kind, pattern)
            .map(|store| store.slice(window.as_ref(), trimmed)),
        None => session.intervals(args.kind, args.key.as_deref(), window.as_ref(), trimmed),
    }
    .with_context(|| format!("Failed to query {} intervals", args.kind))?;
    debug!("Query returned {} records", store.len());

    info!("Step 3/3: Writing output...");
    match &args.output {
        Some(path) => {
            let trace = TraceSummary::from_session(&session, args.source.file.display().to_string());
            let report = IntervalReport::new(
                trace,
                args.kind,
                args.key.clone(),
                window,
                trimmed,
                store,
            );
            let written = if args.compact {
                write_report_compact(&report, path)
            } else {
                write_report(&report, path)
            };
            written.context("Failed to write interval report")?;
            info!("✓ Report written to: {}", path.display());
        }
        None => {
            println!("\n{}", "=".repeat(80));
            println!("{} INTERVALS", args.kind.as_str().to_uppercase());
            println!("{}", "=".repeat(80));
            println!("{}", format_intervals(&store, args.max_lines));
            println!("{}", "=".repeat(80));
        }
    }

    info!(
        "Query completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Validate intervals arguments
///
/// **Public** - can be called before execute to fail fast
pub fn validate_args(args: &IntervalsArgs) -> Result<()> {
    validate_source(&args.source)?;
    validate_window(args.start, args.end)?;

    if args.key.is_some() && args.matching.is_some() {
        bail!("--key and --matching cannot be combined");
    }
    if args.max_lines == 0 {
        bail!("max_lines must be greater than 0");
    }
    Ok(())
}

/// **Private** - key listing for `intervals` without a key
fn print_keys(session: &TraceSession, args: &IntervalsArgs) -> Result<()> {
    let keys = session
        .keys(args.kind)
        .with_context(|| format!("Failed to query {} intervals", args.kind))?;

    println!("\n{}", "=".repeat(80));
    println!("{} KEYS", args.kind.as_str().to_uppercase());
    println!("{}", "=".repeat(80));
    for key in &keys {
        let store = session.intervals(args.kind, Some(key), None, true)?;
        println!(
            "  {:<40} {:>8} records {:>14.6}s",
            key,
            store.len(),
            store.total_duration()
        );
    }
    println!("  {} keys (use --key or --merged to list records)", keys.len());
    println!("{}", "=".repeat(80));
    Ok(())
}
