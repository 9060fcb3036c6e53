//! Events command implementation.

use super::models::EventsArgs;
use super::utils::{load_session, resolve_window, validate_source, validate_window};
use crate::model::Task;
use crate::output::{format_events, write_report, EventReport, TraceSummary};
use anyhow::{bail, Context, Result};
use log::info;

/// Execute the events command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Trace parsing failures
/// * File write errors
pub fn execute_events(args: EventsArgs) -> Result<()> {
    let (session, _) = load_session(&args.source)?;
    let window = resolve_window(&session, args.start, args.end)?;

    // Task equality is by pid, so the name is irrelevant here
    let task = args.pid.map(|pid| Task::new("", pid));
    let events = session.events(args.kind.as_deref(), task.as_ref(), window.as_ref());
    info!("Matched {} events", events.len());

    match &args.output {
        Some(path) => {
            let trace = TraceSummary::from_session(&session, args.source.file.display().to_string());
            let report = EventReport::new(
                trace,
                args.kind.clone(),
                args.pid,
                window,
                events.events().to_vec(),
            );
            write_report(&report, path).context("Failed to write event report")?;
            info!("✓ Report written to: {}", path.display());
        }
        None => {
            println!("\n{}", "=".repeat(80));
            println!("EVENTS");
            println!("{}", "=".repeat(80));
            println!("{}", format_events(events.events(), args.max_lines));
            println!("{}", "=".repeat(80));
        }
    }
    Ok(())
}

/// Validate events arguments
///
/// **Public** - can be called before execute to fail fast
pub fn validate_args(args: &EventsArgs) -> Result<()> {
    validate_source(&args.source)?;
    validate_window(args.start, args.end)?;
    if args.max_lines == 0 {
        bail!("max_lines must be greater than 0");
    }
    Ok(())
}
