//! Output writers for query results.
//!
//! This module handles writing data to disk and to the terminal:
//! - JSON reports (pretty and compact)
//! - Text tables for the CLI

pub mod json;
pub mod report;
pub mod text;

// Re-export main functions
pub use json::{read_report, report_to_string, write_report, write_report_compact};
pub use report::{EventReport, IntervalReport, TraceSummary};
pub use text::{format_events, format_intervals, format_summary};
