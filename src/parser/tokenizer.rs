//! Line tokenizer: one physical trace line in, one `Event` out.
//!
//! Record lines look like
//!
//! ```text
//!   surfaceflinger-311   (  311) [002] d..2  5417.390871: sched_switch: prev_comm=...
//! ```
//!
//! i.e. `<task>-<pid> [(<tgid>)] [<cpu>] <flags> <timestamp>: <kind>: <payload>`.
//! The tgid column and the flag columns are optional; lines that do not fit
//! the envelope are skipped.

use super::header::TraceHeader;
use crate::decoders::{DecoderRegistry, Payload};
use crate::model::{Event, EventFlags, Task};
use crate::utils::config::{BUS_UPDATE_REQUEST, COLUMN_HEADER_MARKER, PROGRESS_LOG_INTERVAL};
use crate::utils::error::TraceError;
use log::{debug, warn};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::io::{BufRead, Lines};
use std::sync::LazyLock;

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<name>.+?)-(?P<pid>\d+)\s+(?:\(\s*(?P<tgid>\d+|-+)\)\s+)?\[(?P<cpu>\d+)\]\s+(?:(?P<flags>[dX.][Nnp.][Hhs.][0-9a-f.])\S*\s+)?(?P<timestamp>\d+\.\d+):\s+(?P<kind>\w+):\s*(?P<payload>.*)$",
    )
    .expect("Invalid trace line regex pattern")
});

/// Envelope fields of one record line, borrowed from the line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLine<'a> {
    pub name: &'a str,
    pub pid: u32,
    /// `None` when the column is absent or shows `-----`
    pub tgid: Option<u32>,
    pub cpu: u32,
    pub flags: Option<EventFlags>,
    pub timestamp: f64,
    pub kind: &'a str,
    pub payload: &'a str,
}

/// Split a record line into its envelope fields
///
/// **Public** - the envelope grammar, usable without a `Tokenizer`
///
/// # Returns
/// `None` if the line is not a record line
pub fn parse_line(line: &str) -> Option<RawLine<'_>> {
    // Systrace HTML dumps end each record line with a literal `\n\`
    let line = line.trim_end();
    let line = line.strip_suffix("\\n\\").unwrap_or(line);

    let caps = LINE_RE.captures(line)?;
    let field = |name: &str| caps.name(name).map(|m| m.as_str());

    Some(RawLine {
        name: field("name")?.trim(),
        pid: field("pid")?.parse().ok()?,
        tgid: field("tgid").and_then(|t| t.parse().ok()),
        cpu: field("cpu")?.parse().ok()?,
        flags: field("flags").and_then(EventFlags::parse),
        timestamp: field("timestamp")?.parse().ok()?,
        kind: field("kind")?,
        payload: field("payload")?.trim_end(),
    })
}

/// What the tokenizer saw while producing events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseStats {
    /// CPUs of kept events
    pub seen_cpus: BTreeSet<u32>,
    /// Record kinds of kept events
    pub seen_record_kinds: BTreeSet<String>,
    /// Latest normalized timestamp among kept events
    pub duration: f64,
    pub events_kept: usize,
    /// Record lines dropped by the allow-list
    pub events_filtered: usize,
    /// Non-empty lines that did not match the envelope grammar
    pub lines_skipped: usize,
}

/// Streaming tokenizer over a trace file
///
/// Yields events in file order. The sequence is single-pass: iterating again
/// means reading the file again.
pub struct Tokenizer<'r, R> {
    lines: Lines<R>,
    registry: &'r DecoderRegistry,
    allow: Option<HashSet<String>>,
    header: TraceHeader,
    origin: Option<f64>,
    stats: ParseStats,
}

impl<'r, R: BufRead> Tokenizer<'r, R> {
    /// Read the header and position the tokenizer on the first record line
    ///
    /// **Public** - main entry point for parsing
    ///
    /// # Arguments
    /// * `reader` - Trace text
    /// * `registry` - Decoders applied to each kept record
    /// * `allow` - Record kinds to keep; `None` keeps everything
    ///
    /// # Errors
    /// * `TraceError::Io` - Reading failed
    /// * `TraceError::MissingHeader` - Input ended before a `TASK-PID` line
    pub fn new(
        reader: R,
        registry: &'r DecoderRegistry,
        allow: Option<&[String]>,
    ) -> Result<Self, TraceError> {
        let mut lines = reader.lines();
        let mut header = TraceHeader::default();

        loop {
            let Some(line) = lines.next().transpose()? else {
                return Err(TraceError::MissingHeader);
            };
            header.observe(&line);
            if line.contains(COLUMN_HEADER_MARKER) {
                // The `| |` row under the column names
                lines.next().transpose()?;
                break;
            }
        }

        debug!(
            "Trace header: tracer={:?}, entries {}/{}",
            header.tracer, header.entries_in, header.entries_written
        );

        Ok(Self {
            lines,
            registry,
            allow: allow.map(|kinds| kinds.iter().cloned().collect()),
            header,
            origin: None,
            stats: ParseStats::default(),
        })
    }

    pub fn header(&self) -> &TraceHeader {
        &self.header
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Raw timestamp of the first tokenized line
    pub fn origin(&self) -> Option<f64> {
        self.origin
    }

    /// Consume the tokenizer, keeping what it collected
    pub fn into_parts(self) -> (TraceHeader, ParseStats) {
        (self.header, self.stats)
    }

    /// Turn one line into a kept event
    ///
    /// **Private** - internal helper
    fn tokenize(&mut self, line: &str) -> Option<Event> {
        let Some(raw) = parse_line(line) else {
            if !line.trim().is_empty() {
                self.stats.lines_skipped += 1;
            }
            return None;
        };

        // The origin is fixed by the first record line, kept or not
        let origin = *self.origin.get_or_insert(raw.timestamp);

        if let Some(allow) = &self.allow {
            if !allow.contains(raw.kind) {
                self.stats.events_filtered += 1;
                return None;
            }
        }

        let mut payload = self.registry.decode(raw.kind, raw.payload);
        let mut timestamp = raw.timestamp - origin;

        if raw.kind == BUS_UPDATE_REQUEST {
            if let Payload::BusUpdateRequest(request) = &mut payload {
                let rebased = request.timestamp - origin;
                if rebased.is_finite() {
                    request.timestamp = rebased;
                    timestamp = rebased;
                } else {
                    warn!(
                        "Ignoring non-finite {} time at {:.6}",
                        BUS_UPDATE_REQUEST, raw.timestamp
                    );
                    request.timestamp = timestamp;
                }
            }
        }

        let event = Event {
            task: Task::new(raw.name, raw.pid).with_tgid(raw.tgid),
            cpu: raw.cpu,
            raw_timestamp: raw.timestamp,
            timestamp,
            flags: raw.flags.unwrap_or_default(),
            kind: raw.kind.to_string(),
            payload,
        };

        self.stats.seen_cpus.insert(event.cpu);
        if !self.stats.seen_record_kinds.contains(&event.kind) {
            self.stats.seen_record_kinds.insert(event.kind.clone());
        }
        self.stats.duration = self.stats.duration.max(event.timestamp);
        self.stats.events_kept += 1;

        if self.stats.events_kept % PROGRESS_LOG_INTERVAL == 0 {
            debug!("Tokenized {} events", self.stats.events_kept);
        }

        Some(event)
    }
}

impl<R: BufRead> Iterator for Tokenizer<'_, R> {
    type Item = Result<Event, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if let Some(event) = self.tokenize(&line) {
                return Some(Ok(event));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "# tracer: nop\n\
        #\n\
        # entries-in-buffer/entries-written: 3/3   #P:4\n\
        #\n\
        #           TASK-PID   TGID   CPU#  ||||    TIMESTAMP  FUNCTION\n\
        #              | |       |      |   ||||       |         |\n";

    #[test]
    fn test_parse_line_with_tgid() {
        let raw = parse_line(
            "  surfaceflinger-311   (  311) [002] d..2  5417.390871: cpu_idle: state=1 cpu_id=2",
        )
        .unwrap();
        assert_eq!(raw.name, "surfaceflinger");
        assert_eq!(raw.pid, 311);
        assert_eq!(raw.tgid, Some(311));
        assert_eq!(raw.cpu, 2);
        assert!(raw.flags.unwrap().irqs_off);
        assert_eq!(raw.timestamp, 5417.390871);
        assert_eq!(raw.kind, "cpu_idle");
        assert_eq!(raw.payload, "state=1 cpu_id=2");
    }

    #[test]
    fn test_parse_line_without_tgid_and_flags() {
        let raw = parse_line("kworker/u16:2-1234 [000] 100.5: workqueue_execute_end: work struct c0").unwrap();
        assert_eq!(raw.name, "kworker/u16:2");
        assert_eq!(raw.tgid, None);
        assert_eq!(raw.flags, None);
    }

    #[test]
    fn test_parse_line_unknown_tgid_and_systrace_suffix() {
        let raw = parse_line(r"  <idle>-0     (-----) [001] ...1    12.000001: cpu_idle: state=4294967295 cpu_id=1\n\")
            .unwrap();
        assert_eq!(raw.pid, 0);
        assert_eq!(raw.tgid, None);
        assert_eq!(raw.payload, "state=4294967295 cpu_id=1");
    }

    #[test]
    fn test_parse_line_rejects_noise() {
        assert!(parse_line("CPU:3 [LOST 120 EVENTS]").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn test_missing_header() {
        let registry = DecoderRegistry::new();
        let result = Tokenizer::new(Cursor::new("# tracer: nop\n"), &registry, None);
        assert!(matches!(result, Err(TraceError::MissingHeader)));
    }

    #[test]
    fn test_normalizes_and_tracks_stats() {
        let text = format!(
            "{}{}\n{}\ngarbage line\n{}\n",
            HEADER,
            "  app-10  [000] ....  50.000000: tracing_mark_write: B|10|draw",
            "  app-10  [001] ....  50.250000: tracing_mark_write: E|10",
            "  app-10  [001] ....  51.000000: sched_waking: comm=app pid=10",
        );
        let registry = DecoderRegistry::standard().unwrap();
        let mut tokenizer = Tokenizer::new(Cursor::new(text), &registry, None).unwrap();
        let events: Vec<Event> = tokenizer.by_ref().collect::<Result<_, _>>().unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].timestamp, 0.0);
        assert_eq!(events[1].timestamp, 0.25);
        assert!(events[2].payload.is_raw());
        assert_eq!(tokenizer.origin(), Some(50.0));
        assert_eq!(tokenizer.header().entries_in, 3);

        let stats = tokenizer.stats();
        assert_eq!(stats.duration, 1.0);
        assert_eq!(stats.lines_skipped, 1);
        assert_eq!(stats.seen_cpus, BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_allow_list_keeps_origin_of_first_line() {
        let text = format!(
            "{}{}\n{}\n",
            HEADER,
            "  app-10  [000] ....  20.000000: sched_waking: comm=app pid=10",
            "  app-10  [002] ....  20.500000: cpu_idle: state=1 cpu_id=2",
        );
        let registry = DecoderRegistry::standard().unwrap();
        let allow = vec!["cpu_idle".to_string()];
        let mut tokenizer = Tokenizer::new(Cursor::new(text), &registry, Some(&allow)).unwrap();
        let events: Vec<Event> = tokenizer.by_ref().collect::<Result<_, _>>().unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, 0.5);
        let stats = tokenizer.stats();
        assert_eq!(stats.events_filtered, 1);
        assert_eq!(stats.seen_cpus, BTreeSet::from([2]));
        assert_eq!(
            stats.seen_record_kinds,
            BTreeSet::from(["cpu_idle".to_string()])
        );
    }

    #[test]
    fn test_bus_update_request_rebased() {
        let text = format!(
            "{}{}\n{}\n",
            HEADER,
            "  app-10  [000] ....  100.000000: sched_waking: comm=app pid=10",
            "  kworker-5  [000] ....  100.900000: bus_update_request: time=100.400000 name=mdss src=22 dest=512 ab=0 ib=0 active=1",
        );
        let registry = DecoderRegistry::standard().unwrap();
        let tokenizer = Tokenizer::new(Cursor::new(text), &registry, None).unwrap();
        let events: Vec<Event> = tokenizer.collect::<Result<_, _>>().unwrap();

        let bus = &events[1];
        assert!((bus.timestamp - 0.4).abs() < 1e-9);
        let Payload::BusUpdateRequest(request) = &bus.payload else {
            panic!("expected bus_update_request payload");
        };
        assert_eq!(request.timestamp, bus.timestamp);
    }

    #[test]
    fn test_bus_update_request_bad_time_keeps_line_time() {
        let text = format!(
            "{}{}\n{}\n{}\n",
            HEADER,
            "  app-10  [000] ....  100.000000: sched_waking: comm=app pid=10",
            "  kworker-5  [000] ....  100.500000: bus_update_request: time=nan name=mdss src=22 dest=512 ab=0 ib=0 active=1",
            "  kworker-5  [000] ....  100.900000: bus_update_request: time=inf name=mdss src=22 dest=512 ab=0 ib=0 active=1",
        );
        let registry = DecoderRegistry::standard().unwrap();
        let mut tokenizer = Tokenizer::new(Cursor::new(text), &registry, None).unwrap();
        let events: Vec<Event> = tokenizer.by_ref().collect::<Result<_, _>>().unwrap();

        let timestamps: Vec<f64> = events.iter().map(|e| e.timestamp).collect();
        assert!(timestamps.iter().all(|t| t.is_finite()));
        assert!((timestamps[1] - 0.5).abs() < 1e-9);
        assert!((timestamps[2] - 0.9).abs() < 1e-9);
        assert!(events[1].payload.is_raw());
        assert!(events[2].payload.is_raw());
        assert!((tokenizer.stats().duration - 0.9).abs() < 1e-9);
    }
}
