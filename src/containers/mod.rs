//! Temporal containers.
//!
//! - `EventSequence`: records ordered by timestamp, sliced as borrowed views
//! - `IntervalStore`: interval records ordered by start, with overlap slicing
//! - `SortedMerge`: k-way merge across many sorted containers

pub mod event_sequence;
pub mod interval_store;
pub mod merge;

// Re-export main types
pub use event_sequence::{Closed, EventSequence, EventView};
pub use interval_store::{IntervalRecord, IntervalStore};
pub use merge::{merge_stores, SortedMerge, Timestamped};
