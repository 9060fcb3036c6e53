use crate::reconstruct::IntervalKind;
use std::path::PathBuf;

/// Where the trace comes from and how to ingest it
///
/// **Public** - shared by every command that reads a trace
#[derive(Debug, Clone, Default)]
pub struct TraceSource {
    /// Trace text file
    pub file: PathBuf,

    /// Record kinds to keep; overrides the config file
    pub kinds: Option<Vec<String>>,

    /// Optional TOML ingestion config
    pub config: Option<PathBuf>,
}

/// Arguments for the summary command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct SummaryArgs {
    pub source: TraceSource,

    /// Also reconstruct every applicable interval kind and count records
    pub intervals: bool,

    /// Reconstruct on scoped threads; overrides the config file
    pub parallel: bool,
}

/// Arguments for the intervals command
#[derive(Debug, Clone)]
pub struct IntervalsArgs {
    pub source: TraceSource,

    /// Interval kind to query
    pub kind: IntervalKind,

    /// One key (section name, cpu, clock, ...)
    pub key: Option<String>,

    /// Keep only intervals whose name contains this text
    pub matching: Option<String>,

    /// Merge all keys instead of listing them
    pub merged: bool,

    /// Query range start, seconds
    pub start: Option<f64>,

    /// Query range end, seconds
    pub end: Option<f64>,

    /// Return whole records instead of clipping them to the range
    pub untrimmed: bool,

    /// Output path for JSON report (optional)
    pub output: Option<PathBuf>,

    /// Write compact JSON
    pub compact: bool,

    /// Rows printed to stdout
    pub max_lines: usize,
}

impl Default for IntervalsArgs {
    fn default() -> Self {
        Self {
            source: TraceSource::default(),
            kind: IntervalKind::Section,
            key: None,
            matching: None,
            merged: false,
            start: None,
            end: None,
            untrimmed: false,
            output: None,
            compact: false,
            max_lines: 50,
        }
    }
}

/// Arguments for the events command
#[derive(Debug, Clone)]
pub struct EventsArgs {
    pub source: TraceSource,

    /// Record kind, e.g. `sched_switch`
    pub kind: Option<String>,

    /// Only events logged by this pid
    pub pid: Option<u32>,

    pub start: Option<f64>,
    pub end: Option<f64>,

    /// Output path for JSON report (optional)
    pub output: Option<PathBuf>,

    pub max_lines: usize,
}

impl Default for EventsArgs {
    fn default() -> Self {
        Self {
            source: TraceSource::default(),
            kind: None,
            pid: None,
            start: None,
            end: None,
            output: None,
            max_lines: 50,
        }
    }
}
