//! Metadata from the `#`-prefixed lines above the column header.

use crate::utils::config::{BUFFER_MARKER, TRACER_MARKER};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TRACER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s+tracer:\s+(?P<tracer>.+)$").expect("Invalid tracer regex pattern")
});

static BUFFER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s+entries-in-buffer/entries-written:\s+(?P<entries_in>\d+)/(?P<entries_written>\d+)")
        .expect("Invalid buffer entries regex pattern")
});

/// Tracer name and ring-buffer occupancy reported by the kernel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceHeader {
    /// Usually `nop`
    pub tracer: Option<String>,
    pub entries_in: u64,
    pub entries_written: u64,
}

impl TraceHeader {
    /// Pick up metadata from one header line
    ///
    /// **Public** - called for every line before the column header
    ///
    /// Only the first tracer line and the first buffer line are used.
    pub fn observe(&mut self, line: &str) {
        let line = line.trim();

        if self.tracer.is_none() && line.contains(TRACER_MARKER) {
            if let Some(caps) = TRACER_RE.captures(line) {
                self.tracer = Some(caps["tracer"].trim().to_string());
            }
        }

        if self.entries_in == 0 && self.entries_written == 0 && line.contains(BUFFER_MARKER) {
            if let Some(caps) = BUFFER_RE.captures(line) {
                self.entries_in = caps["entries_in"].parse().unwrap_or_default();
                self.entries_written = caps["entries_written"].parse().unwrap_or_default();
            }
        }
    }

    /// True when the ring buffer wrapped and older entries were overwritten
    pub fn buffer_overflowed(&self) -> bool {
        self.entries_written > self.entries_in
    }

    /// Entries written to the ring buffer but no longer in it
    pub fn lost_events(&self) -> u64 {
        self.entries_written.saturating_sub(self.entries_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_header_lines() {
        let mut header = TraceHeader::default();
        header.observe("# tracer: nop");
        header.observe("#");
        header.observe("# entries-in-buffer/entries-written: 4096/5120   #P:4");
        assert_eq!(header.tracer.as_deref(), Some("nop"));
        assert_eq!(header.entries_in, 4096);
        assert_eq!(header.entries_written, 5120);
        assert!(header.buffer_overflowed());
        assert_eq!(header.lost_events(), 1024);
    }

    #[test]
    fn test_complete_buffer() {
        let mut header = TraceHeader::default();
        header.observe("# entries-in-buffer/entries-written: 10/10   #P:8");
        assert!(!header.buffer_overflowed());
        assert_eq!(header.lost_events(), 0);
    }

    #[test]
    fn test_first_tracer_wins() {
        let mut header = TraceHeader::default();
        header.observe("# tracer: nop");
        header.observe("# tracer: function");
        assert_eq!(header.tracer.as_deref(), Some("nop"));
    }
}
