//! Summary command implementation.
//!
//! Parses a trace and prints its header metadata and per-kind event counts,
//! optionally reconstructing every applicable interval kind.

use super::models::SummaryArgs;
use super::utils::{load_session, validate_source};
use crate::output::{format_summary, TraceSummary};
use anyhow::{Context, Result};
use log::info;
use std::time::Instant;

/// Execute the summary command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Config or trace cannot be read
/// * Reconstruction hits an invalid interval
pub fn execute_summary(args: SummaryArgs) -> Result<()> {
    let start_time = Instant::now();
    validate_source(&args.source)?;

    info!("Step 1/2: Parsing trace...");
    let (session, config) = load_session(&args.source)?;
    let summary = TraceSummary::from_session(&session, args.source.file.display().to_string());

    println!("\n{}", "=".repeat(80));
    println!("TRACE SUMMARY");
    println!("{}", "=".repeat(80));
    println!("{}", format_summary(&summary));

    if args.intervals {
        info!("Step 2/2: Reconstructing intervals...");
        session
            .reconstruct_all(args.parallel || config.parallel)
            .context("Failed to reconstruct intervals")?;

        println!();
        println!("  Interval kinds:");
        for kind in session.components().kinds() {
            match session.merged(kind) {
                Ok(store) => println!(
                    "    {:<16} {:>8} records {:>14.6}s",
                    kind.as_str(),
                    store.len(),
                    store.total_duration()
                ),
                Err(e) => println!("    {:<16} unavailable ({})", kind.as_str(), e),
            }
        }
    } else {
        info!("Step 2/2: Skipping reconstruction (not requested)");
    }
    println!("{}", "=".repeat(80));

    info!(
        "Summary completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
