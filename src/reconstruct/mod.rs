//! Interval reconstruction from paired and level-change records.
//!
//! Matchers are push-based state machines: the driver calls `feed` for every
//! relevant event in timestamp order, then `finish` exactly once with the
//! trace duration to close whatever is still open.
//!
//! - `PairedMatcher`: nested begin/end, LIFO per key
//! - `AsyncMatcher`: begin/end matched by explicit key
//! - `LevelMatcher`: each change ends the previous value's span

pub mod async_paired;
pub mod level;
pub mod paired;
pub mod payload;

use crate::containers::{IntervalRecord, IntervalStore};
use crate::model::Event;
use crate::utils::error::IntervalError;
use log::debug;
use std::collections::BTreeMap;

// Re-export main types
pub use async_paired::AsyncMatcher;
pub use level::LevelMatcher;
pub use paired::PairedMatcher;
pub use payload::{
    AsyncSpan, BusLevel, BusVote, ClockLevel, CounterLevel, FrequencyLevel, IdleSpan,
    IntervalKind, IntervalPayload, IrqSpan, SectionSpan, SoftirqSpan, TaskRun, WorkSpan,
};

/// Stores of one interval kind, by key (section name, cpu, clock, ...)
pub type KeyedStores = BTreeMap<String, IntervalStore<IntervalPayload>>;

/// Everything one component reconstructed, grouped by kind and key
#[derive(Debug, Clone, Default)]
pub struct IntervalCatalog {
    kinds: BTreeMap<IntervalKind, KeyedStores>,
}

impl IntervalCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `kind` even if it ends up with no intervals
    pub fn declare(&mut self, kind: IntervalKind) {
        self.kinds.entry(kind).or_default();
    }

    /// Store `record` under its payload's kind and `key`
    pub fn insert(&mut self, key: impl Into<String>, record: IntervalRecord<IntervalPayload>) {
        self.kinds
            .entry(record.payload.kind())
            .or_default()
            .entry(key.into())
            .or_default()
            .append(record);
    }

    pub fn stores(&self, kind: IntervalKind) -> Option<&KeyedStores> {
        self.kinds.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = IntervalKind> + '_ {
        self.kinds.keys().copied()
    }

    /// Total records across every kind and key
    pub fn record_count(&self) -> usize {
        self.kinds
            .values()
            .flat_map(|stores| stores.values())
            .map(IntervalStore::len)
            .sum()
    }
}

/// A component that rebuilds intervals from a stream of events
pub trait Reconstructor {
    fn name(&self) -> &'static str;

    /// Consume one event; events arrive in timestamp order
    ///
    /// # Errors
    /// * `IntervalError` - A matched pair produced `end < start`
    fn feed(&mut self, event: &Event) -> Result<(), IntervalError>;

    /// Close open state at `duration` and hand over the intervals
    fn finish(self: Box<Self>, duration: f64) -> Result<IntervalCatalog, IntervalError>;
}

/// Feed `events` of the `consumes` kinds into `reconstructor`, then finish it
///
/// **Public** - the single driver loop shared by every component
///
/// # Errors
/// * `IntervalError` - Propagated from `feed` or `finish`
pub fn drive<'a, I>(
    mut reconstructor: Box<dyn Reconstructor>,
    events: I,
    consumes: &[&str],
    duration: f64,
) -> Result<IntervalCatalog, IntervalError>
where
    I: IntoIterator<Item = &'a Event>,
{
    let name = reconstructor.name();
    let mut fed = 0usize;

    for event in events {
        if consumes.contains(&event.kind.as_str()) {
            reconstructor.feed(event)?;
            fed += 1;
        }
    }

    let catalog = reconstructor.finish(duration)?;
    debug!(
        "Component {} consumed {} events, produced {} intervals",
        name,
        fed,
        catalog.record_count()
    );
    Ok(catalog)
}
