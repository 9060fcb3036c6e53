//! Integration tests for trace sessions: ingestion, filtering and queries.

use ftrace_intervals::components::ComponentTable;
use ftrace_intervals::decoders::DecoderRegistry;
use ftrace_intervals::model::{Interval, Task};
use ftrace_intervals::reconstruct::{IntervalKind, IntervalPayload};
use ftrace_intervals::session::TraceSession;
use ftrace_intervals::utils::config::IngestConfig;
use ftrace_intervals::utils::error::{QueryError, TraceError};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;

const TRACE: &str = "# tracer: nop\n\
    #\n\
    # entries-in-buffer/entries-written: 10/14   #P:2\n\
    #\n\
    #           TASK-PID    TGID   CPU#  ||||    TIMESTAMP  FUNCTION\n\
    #              | |        |      |   ||||       |         |\n\
    \x20 <idle>-0     (-----) [000] d..2 200.000000: sched_switch: prev_comm=swapper/0 prev_pid=0 prev_prio=120 prev_state=R ==> next_comm=app next_pid=10 next_prio=120\n\
    \x20    app-10    (   10) [000] ...1 200.250000: tracing_mark_write: B|10|inflate\n\
    \x20    app-10    (   10) [000] ...1 200.750000: tracing_mark_write: E|10\n\
    \x20    app-10    (   10) [000] d..2 201.000000: sched_switch: prev_comm=app prev_pid=10 prev_prio=120 prev_state=D ==> next_comm=kworker/0:1 next_pid=30 next_prio=120\n\
    \x20 kworker/0:1-30 (   30) [000] .... 201.250000: clock_set_rate: bimc_clk state=200000000 cpu_id=0\n\
    \x20 kworker/0:1-30 (   30) [000] .... 201.500000: clock_set_rate: bimc_clk state=400000000 cpu_id=0\n\
    \x20 <idle>-0     (-----) [001] d.h1 201.600000: irq_handler_entry: irq=13 name=fts_touch\n\
    \x20 <idle>-0     (-----) [001] d.h1 201.700000: irq_handler_exit: irq=13 ret=handled\n\
    \x20    app-10    (   10) [001] ...1 201.800000: unknown_event: something happened\n\
    \x20    app-10    (   10) [001] ...1 202.000000: tracing_mark_write: trace_event_clock_sync: parent_ts=12.5\n";

fn parse(config: &IngestConfig) -> TraceSession {
    TraceSession::parse(
        Cursor::new(TRACE),
        &DecoderRegistry::standard().unwrap(),
        ComponentTable::standard().unwrap(),
        config,
    )
    .unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_open_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(TRACE.as_bytes()).unwrap();
    file.flush().unwrap();

    let session = TraceSession::open(
        file.path(),
        &DecoderRegistry::standard().unwrap(),
        ComponentTable::standard().unwrap(),
        &IngestConfig::default(),
    )
    .unwrap();
    assert_eq!(session.event_sequence().len(), 10);
}

#[test]
fn test_missing_file_is_io_error() {
    let result = TraceSession::open(
        "does/not/exist.txt",
        &DecoderRegistry::standard().unwrap(),
        ComponentTable::standard().unwrap(),
        &IngestConfig::default(),
    );
    assert!(matches!(result, Err(TraceError::Io(_))));
}

#[test]
fn test_header_and_normalization() {
    let session = parse(&IngestConfig::default());

    let header = session.header();
    assert_eq!(header.tracer.as_deref(), Some("nop"));
    assert!(header.buffer_overflowed());
    assert_eq!(header.lost_events(), 4);

    assert_eq!(session.duration(), 2.0);
    assert_eq!(session.interval(), Interval::new(0.0, 2.0).unwrap());
    assert_eq!(session.seen_cpus().iter().copied().collect::<Vec<_>>(), vec![0, 1]);

    let first = &session.event_sequence().events()[0];
    assert_eq!(first.timestamp, 0.0);
    assert_eq!(first.raw_timestamp, 200.0);
    assert_eq!(first.task.tgid, None);
}

#[test]
fn test_undecodable_payloads_stay_raw() {
    let session = parse(&IngestConfig::default());
    let events = session.events(Some("unknown_event"), None, None);
    assert_eq!(events.len(), 1);
    assert!(events.events()[0].payload.is_raw());

    // Clock sync markers fall back to raw text instead of a section
    let marks = session.events(Some("tracing_mark_write"), None, None);
    assert_eq!(marks.len(), 3);
    assert!(marks.events()[2].payload.is_raw());
    assert_eq!(session.keys(IntervalKind::Section).unwrap(), vec!["inflate"]);
}

#[test]
fn test_event_counts_and_filters() {
    let session = parse(&IngestConfig::default());
    let counts = session.event_counts();
    assert_eq!(counts.get("sched_switch"), Some(&2));
    assert_eq!(counts.get("clock_set_rate"), Some(&2));

    let app = Task::new("whatever", 10);
    assert_eq!(session.events(None, Some(&app), None).len(), 5);

    let window = Interval::new(1.0, 1.5).unwrap();
    let in_window = session.events(None, None, Some(&window));
    assert_eq!(in_window.len(), 3);
    assert_eq!(
        session
            .events(Some("clock_set_rate"), None, Some(&window))
            .len(),
        2
    );
}

#[test]
fn test_allow_list_filters_events() {
    let config = IngestConfig {
        kinds: Some(vec!["clock_set_rate".to_string()]),
        parallel: false,
    };
    let session = parse(&config);

    assert_eq!(session.event_sequence().len(), 2);
    // Timestamps stay relative to the first line of the file
    assert_eq!(session.event_sequence().events()[0].timestamp, 1.25);
    assert_eq!(session.seen_cpus().len(), 1);
    assert_eq!(session.duration(), 1.25);

    let err = session
        .intervals(IntervalKind::TaskRun, None, None, true)
        .unwrap_err();
    assert!(matches!(err, QueryError::Unsupported { .. }));
}

#[test]
fn test_clock_and_irq_queries() {
    let session = parse(&IngestConfig::default());

    let clock = session
        .intervals(IntervalKind::ClockFrequency, Some("bimc_clk"), None, true)
        .unwrap();
    let rates: Vec<Option<u64>> = clock
        .iter()
        .map(|r| match &r.payload {
            IntervalPayload::ClockFrequency(c) => c.rate,
            other => panic!("unexpected payload {:?}", other),
        })
        .collect();
    assert_eq!(rates, vec![None, Some(200_000_000), Some(400_000_000)]);

    let irqs = session.intervals(IntervalKind::Irq, None, None, true).unwrap();
    assert_eq!(irqs.len(), 1);
    let irq = irqs.get(0).unwrap();
    assert!(approx(irq.start(), 1.6));
    assert!(approx(irq.end(), 1.7));
    assert!(matches!(&irq.payload, IntervalPayload::Irq(i) if i.handled == Some(true)));
}

#[test]
fn test_trimmed_query_window() {
    let session = parse(&IngestConfig::default());
    let window = Interval::new(0.5, 1.0).unwrap();

    let clipped = session
        .intervals(IntervalKind::Section, Some("inflate"), Some(&window), true)
        .unwrap();
    let record = clipped.get(0).unwrap();
    assert_eq!((record.start(), record.end()), (0.5, 0.75));

    let whole = session
        .intervals(IntervalKind::Section, Some("inflate"), Some(&window), false)
        .unwrap();
    assert_eq!(whole.get(0).unwrap().start(), 0.25);

    let missing = session
        .intervals(IntervalKind::Section, Some("nope"), None, true)
        .unwrap();
    assert!(missing.is_empty());
}

#[test]
fn test_parallel_reconstruction_matches_lazy() {
    let lazy = parse(&IngestConfig::default());
    let eager = parse(&IngestConfig::default());
    eager.reconstruct_all(true).unwrap();

    for kind in [
        IntervalKind::Section,
        IntervalKind::TaskRun,
        IntervalKind::ClockFrequency,
        IntervalKind::Irq,
    ] {
        assert_eq!(
            lazy.merged(kind).unwrap(),
            eager.merged(kind).unwrap(),
            "kind {}",
            kind
        );
    }
}

#[test]
fn test_missing_header_rejected() {
    let result = TraceSession::parse(
        Cursor::new("# tracer: nop\n  app-10 [000] 1.0: foo: bar\n"),
        &DecoderRegistry::standard().unwrap(),
        ComponentTable::standard().unwrap(),
        &IngestConfig::default(),
    );
    assert!(matches!(result, Err(TraceError::MissingHeader)));
}

fn parse_body(body: &str) -> TraceSession {
    let text = format!(
        "# tracer: nop\n\
         #           TASK-PID   CPU#  ||||    TIMESTAMP  FUNCTION\n\
         #              | |       |   ||||       |         |\n{}",
        body
    );
    TraceSession::parse(
        Cursor::new(text),
        &DecoderRegistry::standard().unwrap(),
        ComponentTable::standard().unwrap(),
        &IngestConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_irq_entries_without_exits_close_at_duration() {
    let session = parse_body(
        "  <idle>-0     [000] d.h1 10.000000: irq_handler_entry: irq=13 name=fts_touch\n\
         \x20 <idle>-0     [000] ..s1 10.500000: softirq_entry: vec=3 [action=NET_RX]\n\
         \x20    app-10    [000] ...1 12.000000: tracing_mark_write: B|10|idle\n",
    );

    let irqs = session.intervals(IntervalKind::Irq, None, None, true).unwrap();
    assert_eq!(irqs.len(), 1);
    let irq = irqs.get(0).unwrap();
    assert_eq!((irq.start(), irq.end()), (0.0, 2.0));

    let softirqs = session
        .intervals(IntervalKind::Softirq, None, None, true)
        .unwrap();
    assert_eq!(softirqs.len(), 1);
    assert_eq!(softirqs.get(0).unwrap().end(), 2.0);

    let err = session
        .intervals(IntervalKind::Workqueue, None, None, true)
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Unsupported { missing, .. } if missing == vec!["workqueue_execute_start".to_string()]
    ));
}

#[test]
fn test_bus_votes_ignore_non_finite_times() {
    let session = parse_body(
        "  kworker-5  [000] .... 10.000000: bus_update_request: time=10.000000 name=mdss src=22 dest=512 ab=0 ib=0 active=1\n\
         \x20 kworker-5  [000] .... 10.500000: bus_update_request: time=nan name=mdss src=22 dest=512 ab=5 ib=5 active=1\n\
         \x20 kworker-5  [000] .... 11.000000: bus_update_request: time=inf name=mdss src=22 dest=512 ab=7 ib=7 active=1\n\
         \x20 kworker-5  [000] .... 11.500000: bus_update_request: time=11.250000 name=mdss src=22 dest=512 ab=9 ib=9 active=1\n",
    );

    assert_eq!(session.duration(), 1.25);
    let timestamps = session.event_sequence().timestamps();
    assert!(timestamps.iter().all(|t| t.is_finite()));
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));

    let votes = session
        .intervals(IntervalKind::BusVote, None, None, true)
        .unwrap();
    assert!(!votes.is_empty());
    assert!(votes.iter().all(|r| r.end().is_finite()));
}
