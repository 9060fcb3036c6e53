//! Trace session: parses one file and answers interval queries over it.
//!
//! The session owns the full event sequence and the header metadata. Each
//! component is instantiated and driven the first time one of its interval
//! kinds is queried; the resulting catalog and the merged "all keys" view
//! are cached for the life of the session.

use crate::components::{ComponentSpec, ComponentTable};
use crate::containers::{merge_stores, Closed, EventSequence, IntervalStore};
use crate::decoders::DecoderRegistry;
use crate::model::{Interval, Task};
use crate::parser::{ParseStats, TraceHeader, Tokenizer};
use crate::reconstruct::{drive, IntervalCatalog, IntervalKind, IntervalPayload};
use crate::utils::config::IngestConfig;
use crate::utils::error::{IntervalError, QueryError, TraceError};
use log::{debug, info, warn};
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

type CatalogSlot = OnceCell<Result<IntervalCatalog, IntervalError>>;

/// A parsed trace plus lazily reconstructed intervals
pub struct TraceSession {
    header: TraceHeader,
    stats: ParseStats,
    events: EventSequence,
    interval: Interval,
    components: ComponentTable,
    catalogs: Vec<CatalogSlot>,
    merged: BTreeMap<IntervalKind, OnceCell<IntervalStore<IntervalPayload>>>,
}

impl TraceSession {
    /// Parse a trace from any buffered reader
    ///
    /// **Public** - main entry point for building a session
    ///
    /// # Arguments
    /// * `reader` - Trace text, positioned at the start of the header
    /// * `registry` - Payload decoders
    /// * `components` - Reconstruction components available to queries
    /// * `config` - Allow-list of record kinds
    ///
    /// # Errors
    /// * `TraceError::Io` - Reading failed
    /// * `TraceError::MissingHeader` - No column header found
    pub fn parse<R: BufRead>(
        reader: R,
        registry: &DecoderRegistry,
        components: ComponentTable,
        config: &IngestConfig,
    ) -> Result<Self, TraceError> {
        let mut tokenizer = Tokenizer::new(reader, registry, config.kinds.as_deref())?;

        let mut events = EventSequence::new();
        for event in tokenizer.by_ref() {
            events.append(event?);
        }
        let (header, stats) = tokenizer.into_parts();

        info!(
            "Parsed {} events across {} CPUs and {} record kinds",
            stats.events_kept,
            stats.seen_cpus.len(),
            stats.seen_record_kinds.len()
        );
        if stats.lines_skipped > 0 {
            debug!("Skipped {} unrecognized lines", stats.lines_skipped);
        }
        if header.buffer_overflowed() {
            warn!(
                "Trace buffer overflowed, {} events lost",
                header.lost_events()
            );
        }

        let interval = Interval::new(0.0, stats.duration)?;
        let catalogs = components.specs().iter().map(|_| OnceCell::new()).collect();
        let merged = components.kinds().map(|kind| (kind, OnceCell::new())).collect();

        Ok(Self {
            header,
            stats,
            events,
            interval,
            components,
            catalogs,
            merged,
        })
    }

    /// Open and parse a trace file
    ///
    /// # Errors
    /// * `TraceError::Io` - File cannot be opened or read
    /// * `TraceError::MissingHeader` - No column header found
    pub fn open(
        path: impl AsRef<Path>,
        registry: &DecoderRegistry,
        components: ComponentTable,
        config: &IngestConfig,
    ) -> Result<Self, TraceError> {
        let path = path.as_ref();
        info!("Parsing {}", path.display());
        let file = File::open(path)?;
        Self::parse(BufReader::new(file), registry, components, config)
    }

    pub fn header(&self) -> &TraceHeader {
        &self.header
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Timestamp of the last kept event
    pub fn duration(&self) -> f64 {
        self.stats.duration
    }

    /// `[0, duration]`
    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn seen_cpus(&self) -> &BTreeSet<u32> {
        &self.stats.seen_cpus
    }

    pub fn seen_record_kinds(&self) -> &BTreeSet<String> {
        &self.stats.seen_record_kinds
    }

    pub fn components(&self) -> &ComponentTable {
        &self.components
    }

    /// Every kept event, in timestamp order
    pub fn event_sequence(&self) -> &EventSequence {
        &self.events
    }

    /// Events filtered by record kind, task and time range
    ///
    /// **Public** - event query API
    ///
    /// # Arguments
    /// * `kind` - Record kind, e.g. `sched_switch`
    /// * `task` - Only events logged by this task (compared by pid)
    /// * `interval` - Closed time range
    pub fn events(
        &self,
        kind: Option<&str>,
        task: Option<&Task>,
        interval: Option<&Interval>,
    ) -> EventSequence {
        let view = self.events.slice(interval, Closed::Both);
        if kind.is_none() && task.is_none() {
            return view.to_sequence();
        }
        view.iter()
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .filter(|e| task.map_or(true, |t| e.is_from(t)))
            .cloned()
            .collect()
    }

    /// Number of kept events per record kind
    pub fn event_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.kind.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Intervals of `kind`, optionally for one key and time range
    ///
    /// **Public** - interval query API
    ///
    /// # Arguments
    /// * `kind` - Interval kind to query
    /// * `key` - One key (section name, cpu, clock, ...); `None` merges all keys
    /// * `interval` - Keep records overlapping this range; `None` keeps all
    /// * `trimmed` - Clip returned records to `interval`
    ///
    /// # Errors
    /// * `QueryError::Unsupported` - The trace lacks a required record kind
    /// * `QueryError::UnknownKind` - No component produces `kind`
    /// * `QueryError::Reconstruction` - Reconstruction hit `end < start`
    pub fn intervals(
        &self,
        kind: IntervalKind,
        key: Option<&str>,
        interval: Option<&Interval>,
        trimmed: bool,
    ) -> Result<IntervalStore<IntervalPayload>, QueryError> {
        let Some(key) = key else {
            return Ok(self.merged(kind)?.slice(interval, trimmed));
        };

        self.check_supported(kind)?;
        let catalog = self.catalog(kind)?;
        Ok(catalog
            .stores(kind)
            .and_then(|stores| stores.get(key))
            .map(|store| store.slice(interval, trimmed))
            .unwrap_or_default())
    }

    /// Every interval of `kind` across all keys, ordered by start
    ///
    /// # Errors
    /// Same as `intervals`
    pub fn merged(&self, kind: IntervalKind) -> Result<&IntervalStore<IntervalPayload>, QueryError> {
        self.check_supported(kind)?;
        let catalog = self.catalog(kind)?;

        let cell = self
            .merged
            .get(&kind)
            .ok_or_else(|| QueryError::UnknownKind(kind.to_string()))?;
        if let Some(store) = cell.get() {
            return Ok(store);
        }

        let stores = catalog.stores(kind).into_iter().flat_map(|s| s.values());
        let store = merge_stores(stores)?;
        Ok(cell.get_or_init(|| store))
    }

    /// Keys present for `kind`, sorted
    ///
    /// # Errors
    /// Same as `intervals`
    pub fn keys(&self, kind: IntervalKind) -> Result<Vec<String>, QueryError> {
        self.check_supported(kind)?;
        let catalog = self.catalog(kind)?;
        Ok(catalog
            .stores(kind)
            .map(|stores| stores.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Intervals of `kind` whose name contains `pattern`, across all keys
    ///
    /// # Errors
    /// Same as `intervals`
    pub fn intervals_matching(
        &self,
        kind: IntervalKind,
        pattern: &str,
    ) -> Result<IntervalStore<IntervalPayload>, QueryError> {
        Ok(self.merged(kind)?.filter(|p| p.label().contains(pattern)))
    }

    /// Run every component whose record kinds appear in the trace
    ///
    /// **Public** - warms the cache before many queries
    ///
    /// With `parallel`, each component runs on its own scoped thread over
    /// the shared event sequence. Components are independent, so the result
    /// is the same either way.
    ///
    /// # Errors
    /// * `QueryError::Reconstruction` - First component failure, in table order
    pub fn reconstruct_all(&self, parallel: bool) -> Result<(), QueryError> {
        let pending: Vec<(usize, ComponentSpec)> = self
            .components
            .specs()
            .iter()
            .copied()
            .enumerate()
            .filter(|(index, spec)| {
                self.catalogs[*index].get().is_none() && self.applicable(spec)
            })
            .collect();

        if parallel && pending.len() > 1 {
            info!("Reconstructing {} components in parallel", pending.len());
            let events = &self.events;
            let duration = self.duration();

            let results: Vec<(usize, Result<IntervalCatalog, IntervalError>)> =
                std::thread::scope(|scope| {
                    let handles: Vec<_> = pending
                        .iter()
                        .map(|(index, spec)| {
                            let spec = *spec;
                            let index = *index;
                            scope.spawn(move || (index, run_component(&spec, events, duration)))
                        })
                        .collect();
                    handles
                        .into_iter()
                        .map(|handle| {
                            handle
                                .join()
                                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                        })
                        .collect()
                });

            for (index, result) in results {
                // Cannot already be set: `pending` only holds empty slots
                let _ = self.catalogs[index].set(result);
            }
        }

        for (index, _) in &pending {
            self.catalog_at(*index)?;
        }
        Ok(())
    }

    /// True if at least one record kind the component consumes was seen
    ///
    /// **Private** - internal helper
    fn applicable(&self, spec: &ComponentSpec) -> bool {
        spec.consumes()
            .iter()
            .any(|kind| self.stats.seen_record_kinds.contains(*kind))
    }

    /// **Private** - precondition check shared by the interval queries
    fn check_supported(&self, kind: IntervalKind) -> Result<(), QueryError> {
        let missing: Vec<String> = kind
            .requires()
            .iter()
            .filter(|required| !self.stats.seen_record_kinds.contains(**required))
            .map(|required| required.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        warn!("{} intervals unavailable, trace lacks {:?}", kind, missing);
        Err(QueryError::Unsupported {
            kind: kind.to_string(),
            missing,
        })
    }

    /// Catalog of the component producing `kind`, built on first use
    ///
    /// **Private** - internal helper
    fn catalog(&self, kind: IntervalKind) -> Result<&IntervalCatalog, QueryError> {
        let (index, _) = self
            .components
            .owner(kind)
            .ok_or_else(|| QueryError::UnknownKind(kind.to_string()))?;
        self.catalog_at(index)
    }

    fn catalog_at(&self, index: usize) -> Result<&IntervalCatalog, QueryError> {
        let spec = &self.components.specs()[index];
        self.catalogs[index]
            .get_or_init(|| run_component(spec, &self.events, self.duration()))
            .as_ref()
            .map_err(|e| QueryError::Reconstruction(e.clone()))
    }
}

/// Instantiate one component and drive it over the events
///
/// **Private** - shared by lazy and parallel reconstruction
fn run_component(
    spec: &ComponentSpec,
    events: &EventSequence,
    duration: f64,
) -> Result<IntervalCatalog, IntervalError> {
    info!("Reconstructing {} intervals", spec.name);
    drive((spec.factory)(), events, &spec.consumes(), duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TRACE: &str = "# tracer: nop\n\
        #           TASK-PID   CPU#  ||||    TIMESTAMP  FUNCTION\n\
        #              | |       |   ||||       |         |\n\
        \x20   app-10  [000] ....  10.000000: tracing_mark_write: B|10|draw\n\
        \x20   app-10  [000] ....  10.500000: tracing_mark_write: E|10\n\
        \x20   app-10  [001] ....  11.000000: tracing_mark_write: B|10|sync\n";

    fn session() -> TraceSession {
        TraceSession::parse(
            Cursor::new(TRACE),
            &DecoderRegistry::standard().unwrap(),
            ComponentTable::standard().unwrap(),
            &IngestConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_section_query_with_closure() {
        let session = session();
        assert_eq!(session.duration(), 1.0);

        let draw = session
            .intervals(IntervalKind::Section, Some("draw"), None, true)
            .unwrap();
        assert_eq!(draw.len(), 1);
        assert_eq!(draw.get(0).unwrap().interval, Interval::new(0.0, 0.5).unwrap());

        // Still open at the end of the trace
        let sync = session
            .intervals(IntervalKind::Section, Some("sync"), None, true)
            .unwrap();
        assert_eq!(sync.get(0).unwrap().interval, Interval::new(1.0, 1.0).unwrap());
    }

    #[test]
    fn test_unsupported_kind() {
        let session = session();
        let err = session
            .intervals(IntervalKind::TaskRun, None, None, true)
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::Unsupported {
                kind: "task_run".to_string(),
                missing: vec!["sched_switch".to_string()]
            }
        );
    }

    #[test]
    fn test_merged_is_cached() {
        let session = session();
        let first = session.merged(IntervalKind::Section).unwrap() as *const _;
        let second = session.merged(IntervalKind::Section).unwrap() as *const _;
        assert_eq!(first, second);
        assert_eq!(session.keys(IntervalKind::Section).unwrap(), vec!["draw", "sync"]);
    }
}
