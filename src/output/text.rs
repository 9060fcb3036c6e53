//! Terminal tables for the CLI.

use super::report::TraceSummary;
use crate::containers::IntervalStore;
use crate::model::Event;
use crate::reconstruct::IntervalPayload;

const LABEL_WIDTH: usize = 40;

/// Render trace metadata and per-kind event counts
///
/// **Public** - used by the `summary` command
pub fn format_summary(summary: &TraceSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!("  Source:       {}", summary.source));
    lines.push(format!(
        "  Tracer:       {}",
        summary.tracer.as_deref().unwrap_or("unknown")
    ));
    lines.push(format!("  Duration:     {:.6}s", summary.duration));
    lines.push(format!(
        "  Buffer:       {} in, {} written",
        summary.entries_in, summary.entries_written
    ));
    if summary.buffer_overflowed {
        lines.push(format!(
            "  Overflowed:   yes ({} events lost)",
            summary.lost_events
        ));
    } else {
        lines.push("  Overflowed:   no".to_string());
    }
    let cpus: Vec<String> = summary.seen_cpus.iter().map(u32::to_string).collect();
    lines.push(format!("  CPUs:         {}", cpus.join(", ")));

    lines.push(String::new());
    lines.push("  ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━┓".to_string());
    lines.push(format!("  ┃ {:<40} ┃ {:^10} ┃", "Record Kind", "EVENTS"));
    lines.push("  ┣━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━┫".to_string());
    for (kind, count) in &summary.event_counts {
        lines.push(format!("  ┃ {:<40} ┃ {:>10} ┃", truncate(kind), count));
    }
    lines.push("  ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━┛".to_string());

    lines.join("\n")
}

/// Render up to `max_lines` interval records
///
/// **Public** - used by the `intervals` command
pub fn format_intervals(store: &IntervalStore<IntervalPayload>, max_lines: usize) -> String {
    let mut lines = Vec::new();

    lines.push("  ┏━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓".to_string());
    lines.push(format!(
        "  ┃ {:^12} ┃ {:^12} ┃ {:^12} ┃ {:<40} ┃",
        "START", "END", "DURATION", "Label"
    ));
    lines.push("  ┣━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┫".to_string());
    for record in store.iter().take(max_lines) {
        lines.push(format!(
            "  ┃ {:>12.6} ┃ {:>12.6} ┃ {:>12.6} ┃ {:<40} ┃",
            record.start(),
            record.end(),
            record.duration(),
            truncate(&describe(&record.payload))
        ));
    }
    lines.push("  ┗━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".to_string());

    if store.len() > max_lines {
        lines.push(format!("  ... {} more", store.len() - max_lines));
    }
    lines.push(format!(
        "  {} intervals, {:.6}s total",
        store.len(),
        store.total_duration()
    ));

    lines.join("\n")
}

/// Render up to `max_lines` events in a trace-like layout
///
/// **Public** - used by the `events` command
pub fn format_events(events: &[Event], max_lines: usize) -> String {
    let mut lines: Vec<String> = events
        .iter()
        .take(max_lines)
        .map(|e| {
            format!(
                "  {:>12.6}  [{:03}]  {}-{}  {}",
                e.timestamp, e.cpu, e.task.name, e.task.pid, e.kind
            )
        })
        .collect();

    if events.len() > max_lines {
        lines.push(format!("  ... {} more", events.len() - max_lines));
    }
    lines.push(format!("  {} events", events.len()));
    lines.join("\n")
}

/// Label plus the level or state carried by the payload
///
/// **Private** - internal helper
fn describe(payload: &IntervalPayload) -> String {
    let label = payload.label();
    match payload {
        IntervalPayload::Counter(c) => level(&label, c.value),
        IntervalPayload::ClockFrequency(c) => level(&label, c.rate),
        IntervalPayload::CpuFrequency(f) => level(&label, f.frequency),
        IntervalPayload::CpuIdle(i) => format!("{} state {}", label, i.state),
        IntervalPayload::TaskRun(r) => format!("{}-{}", label, r.task.pid),
        IntervalPayload::BusVote(b) => match &b.vote {
            Some(vote) => format!("{} ab={} ib={}", label, vote.ab, vote.ib),
            None => format!("{} = ?", label),
        },
        _ => label,
    }
}

fn level<V: std::fmt::Display>(label: &str, value: Option<V>) -> String {
    match value {
        Some(v) => format!("{} = {}", label, v),
        None => format!("{} = ?", label),
    }
}

/// Keep the tail of long labels so they fit the table
fn truncate(text: &str) -> String {
    let count = text.chars().count();
    if count <= LABEL_WIDTH {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - (LABEL_WIDTH - 3)).collect();
    format!("...{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::IntervalRecord;
    use crate::model::Interval;
    use crate::reconstruct::SectionSpan;
    use std::collections::BTreeMap;

    #[test]
    fn test_truncate_keeps_tail() {
        let long = "a".repeat(50) + "end";
        let short = truncate(&long);
        assert_eq!(short.chars().count(), LABEL_WIDTH);
        assert!(short.starts_with("..."));
        assert!(short.ends_with("end"));
        assert_eq!(truncate("draw"), "draw");
    }

    #[test]
    fn test_format_intervals_counts_overflow() {
        let store: IntervalStore<IntervalPayload> = (0..3)
            .map(|i| {
                IntervalRecord::new(
                    Interval::new(i as f64, i as f64 + 0.5).unwrap(),
                    IntervalPayload::Section(SectionSpan {
                        name: format!("s{}", i),
                        pid: 1,
                        tid: 1,
                    }),
                )
            })
            .collect();
        let text = format_intervals(&store, 2);
        assert!(text.contains("s0"));
        assert!(!text.contains("s2"));
        assert!(text.contains("... 1 more"));
        assert!(text.contains("3 intervals, 1.500000s total"));
    }

    #[test]
    fn test_format_summary_overflow_line() {
        let summary = TraceSummary {
            source: "trace.txt".to_string(),
            tracer: Some("nop".to_string()),
            duration: 2.0,
            entries_in: 10,
            entries_written: 12,
            lost_events: 2,
            buffer_overflowed: true,
            seen_cpus: vec![0, 1],
            event_counts: BTreeMap::from([("sched_switch".to_string(), 7)]),
        };
        let text = format_summary(&summary);
        assert!(text.contains("yes (2 events lost)"));
        assert!(text.contains("0, 1"));
        assert!(text.contains("sched_switch"));
    }
}
