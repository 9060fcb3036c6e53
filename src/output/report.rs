//! Report schema written by the CLI.

use crate::containers::IntervalStore;
use crate::model::{Event, Interval};
use crate::reconstruct::{IntervalKind, IntervalPayload};
use crate::session::TraceSession;
use crate::utils::config::SCHEMA_VERSION;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Facts about the parsed trace, shared by every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    /// File the trace was read from
    pub source: String,
    pub tracer: Option<String>,
    /// Seconds
    pub duration: f64,
    pub entries_in: u64,
    pub entries_written: u64,
    pub lost_events: u64,
    pub buffer_overflowed: bool,
    pub seen_cpus: Vec<u32>,
    /// Kept events per record kind
    pub event_counts: BTreeMap<String, usize>,
}

impl TraceSummary {
    pub fn from_session(session: &TraceSession, source: impl Into<String>) -> Self {
        let header = session.header();
        Self {
            source: source.into(),
            tracer: header.tracer.clone(),
            duration: session.duration(),
            entries_in: header.entries_in,
            entries_written: header.entries_written,
            lost_events: header.lost_events(),
            buffer_overflowed: header.buffer_overflowed(),
            seen_cpus: session.seen_cpus().iter().copied().collect(),
            event_counts: session.event_counts(),
        }
    }
}

/// Result of an interval query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalReport {
    pub version: String,
    pub generated_at: String,
    pub trace: TraceSummary,
    pub kind: IntervalKind,
    /// `None` when all keys were merged
    pub key: Option<String>,
    /// Query range, `None` for the whole trace
    pub window: Option<Interval>,
    pub trimmed: bool,
    /// Sum of interval durations, seconds
    pub total_duration: f64,
    pub intervals: IntervalStore<IntervalPayload>,
}

impl IntervalReport {
    pub fn new(
        trace: TraceSummary,
        kind: IntervalKind,
        key: Option<String>,
        window: Option<Interval>,
        trimmed: bool,
        intervals: IntervalStore<IntervalPayload>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            trace,
            kind,
            key,
            window,
            trimmed,
            total_duration: intervals.total_duration(),
            intervals,
        }
    }
}

/// Result of an event query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventReport {
    pub version: String,
    pub generated_at: String,
    pub trace: TraceSummary,
    pub kind: Option<String>,
    pub pid: Option<u32>,
    pub window: Option<Interval>,
    pub events: Vec<Event>,
}

impl EventReport {
    pub fn new(
        trace: TraceSummary,
        kind: Option<String>,
        pid: Option<u32>,
        window: Option<Interval>,
        events: Vec<Event>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            trace,
            kind,
            pid,
            window,
            events,
        }
    }
}
