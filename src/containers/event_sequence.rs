//! Timestamp-ordered event sequence, sliceable by time range.
//!
//! Events are kept sorted by normalized timestamp in a `Vec`, with a parallel
//! `Vec<f64>` of timestamps for binary search. Slices are borrowed views, so
//! narrowing a query never copies events.

use crate::model::{Event, Interval};
use std::ops::Range;

/// Which ends of a query interval are inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Closed {
    /// `[start, end]`
    #[default]
    Both,
    /// `[start, end)`
    Left,
    /// `(start, end]`
    Right,
}

impl Closed {
    fn left(self) -> bool {
        matches!(self, Closed::Both | Closed::Left)
    }

    fn right(self) -> bool {
        matches!(self, Closed::Both | Closed::Right)
    }
}

/// Index range of `timestamps` that falls inside `interval`
///
/// **Private** - shared by `EventSequence` and `EventView`
fn slice_bounds(timestamps: &[f64], interval: &Interval, closed: Closed) -> Range<usize> {
    let (start, end) = (interval.start(), interval.end());

    let left = if closed.left() {
        timestamps.partition_point(|t| *t < start)
    } else {
        timestamps.partition_point(|t| *t <= start)
    };
    let right = if closed.right() {
        timestamps.partition_point(|t| *t <= end)
    } else {
        timestamps.partition_point(|t| *t < end)
    };

    if left >= timestamps.len() || left >= right {
        return 0..0;
    }
    left..right
}

/// Append-only, timestamp-sorted list of events
///
/// Invariant: `timestamps` is sorted and `events[i].timestamp == timestamps[i]`.
#[derive(Debug, Clone, Default)]
pub struct EventSequence {
    events: Vec<Event>,
    timestamps: Vec<f64>,
}

impl EventSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event at its sorted position
    ///
    /// **Public** - O(log n) search; the insert is an O(1) push when events
    /// arrive in order, which is the normal case while parsing.
    ///
    /// Events with equal timestamps keep their arrival order.
    pub fn append(&mut self, event: Event) {
        let ts = event.timestamp;
        let idx = self.timestamps.partition_point(|t| *t <= ts);
        self.timestamps.insert(idx, ts);
        self.events.insert(idx, event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Borrowed view over the whole sequence
    pub fn view(&self) -> EventView<'_> {
        EventView {
            events: &self.events,
            timestamps: &self.timestamps,
        }
    }

    /// Events whose timestamps fall inside `interval`
    ///
    /// **Public** - main query entry point
    ///
    /// # Arguments
    /// * `interval` - Time range; `None` returns the whole sequence
    /// * `closed` - Which ends of the range are inclusive
    pub fn slice(&self, interval: Option<&Interval>, closed: Closed) -> EventView<'_> {
        self.view().slice(interval, closed)
    }

    /// First timestamp
    pub fn start(&self) -> Option<f64> {
        self.timestamps.first().copied()
    }

    /// Last timestamp
    pub fn end(&self) -> Option<f64> {
        self.timestamps.last().copied()
    }

    pub fn interval(&self) -> Option<Interval> {
        self.view().interval()
    }

    pub fn duration(&self) -> Option<f64> {
        self.interval().map(|i| i.duration())
    }
}

impl FromIterator<Event> for EventSequence {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut sequence = EventSequence::new();
        for event in iter {
            sequence.append(event);
        }
        sequence
    }
}

impl Extend<Event> for EventSequence {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        for event in iter {
            self.append(event);
        }
    }
}

impl<'a> IntoIterator for &'a EventSequence {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Borrowed, contiguous sub-range of an `EventSequence`
#[derive(Debug, Clone, Copy)]
pub struct EventView<'a> {
    events: &'a [Event],
    timestamps: &'a [f64],
}

impl<'a> EventView<'a> {
    /// Narrow this view further; same semantics as `EventSequence::slice`
    pub fn slice(&self, interval: Option<&Interval>, closed: Closed) -> EventView<'a> {
        let Some(interval) = interval else {
            return *self;
        };
        let range = slice_bounds(self.timestamps, interval, closed);
        EventView {
            events: &self.events[range.clone()],
            timestamps: &self.timestamps[range],
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, Event> {
        self.events.iter()
    }

    pub fn events(&self) -> &'a [Event] {
        self.events
    }

    pub fn start(&self) -> Option<f64> {
        self.timestamps.first().copied()
    }

    pub fn end(&self) -> Option<f64> {
        self.timestamps.last().copied()
    }

    /// Span from first to last timestamp, `None` when empty
    pub fn interval(&self) -> Option<Interval> {
        Interval::new(self.start()?, self.end()?).ok()
    }

    /// Copy the viewed events into an owned sequence
    pub fn to_sequence(&self) -> EventSequence {
        EventSequence {
            events: self.events.to_vec(),
            timestamps: self.timestamps.to_vec(),
        }
    }
}

impl<'a> IntoIterator for EventView<'a> {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
