//! Start-ordered store of interval-bearing records with overlap slicing.
//!
//! Records are sorted by `interval.start`. Besides the start and end arrays,
//! the store keeps `reach`, the running maximum of end timestamps. Because
//! `reach` is non-decreasing, one binary search finds the first record that
//! can still overlap a query, so slices never miss a long record that began
//! before the query window.

use crate::model::Interval;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An interval plus the domain payload it describes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalRecord<T> {
    pub interval: Interval,
    pub payload: T,
}

impl<T> IntervalRecord<T> {
    pub fn new(interval: Interval, payload: T) -> Self {
        Self { interval, payload }
    }

    pub fn start(&self) -> f64 {
        self.interval.start()
    }

    pub fn end(&self) -> f64 {
        self.interval.end()
    }

    pub fn duration(&self) -> f64 {
        self.interval.duration()
    }

    /// Same interval, transformed payload
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> IntervalRecord<U> {
        IntervalRecord {
            interval: self.interval,
            payload: f(self.payload),
        }
    }
}

/// Insertion-sorted (by start) list of `IntervalRecord<T>`
///
/// Serializes as a plain list of records; the search arrays are rebuilt on
/// deserialization.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStore<T> {
    records: Vec<IntervalRecord<T>>,
    starts: Vec<f64>,
    ends: Vec<f64>,
    reach: Vec<f64>,
}

impl<T> Default for IntervalStore<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            starts: Vec::new(),
            ends: Vec::new(),
            reach: Vec::new(),
        }
    }
}

impl<T> IntervalStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record at its sorted position
    ///
    /// **Public** - reconstruction emits records through this
    ///
    /// Records with equal starts keep their insertion order. Appending in
    /// start order is O(log n); an out-of-order insert also rebuilds the
    /// `reach` suffix after the insertion point.
    pub fn append(&mut self, record: IntervalRecord<T>) {
        let (start, end) = (record.start(), record.end());
        let idx = self.starts.partition_point(|s| *s <= start);

        self.starts.insert(idx, start);
        self.ends.insert(idx, end);
        self.records.insert(idx, record);

        let mut running = if idx == 0 { end } else { self.reach[idx - 1].max(end) };
        self.reach.insert(idx, running);
        for i in idx + 1..self.reach.len() {
            running = running.max(self.ends[i]);
            self.reach[i] = running;
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IntervalRecord<T>> {
        self.records.iter()
    }

    pub fn records(&self) -> &[IntervalRecord<T>] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&IntervalRecord<T>> {
        self.records.get(index)
    }

    pub fn starts(&self) -> &[f64] {
        &self.starts
    }

    /// Earliest start, `None` when empty
    pub fn start(&self) -> Option<f64> {
        self.starts.first().copied()
    }

    /// Latest end, `None` when empty
    pub fn end(&self) -> Option<f64> {
        self.reach.last().copied()
    }

    pub fn interval(&self) -> Option<Interval> {
        Interval::new(self.start()?, self.end()?).ok()
    }

    /// Sum of record durations (overlaps are counted twice)
    pub fn total_duration(&self) -> f64 {
        self.records.iter().map(|r| r.duration()).sum()
    }

    /// Indices of records overlapping `[start, end]`, in start order
    ///
    /// **Private** - overlap search behind `slice`
    fn overlapping(&self, query: &Interval) -> impl Iterator<Item = usize> + '_ {
        let (start, end) = (query.start(), query.end());
        let lo = self.reach.partition_point(|r| *r < start);
        let hi = self.starts.partition_point(|s| *s <= end);
        (lo..hi.max(lo)).filter(move |&i| self.ends[i] >= start)
    }
}

impl<T: Clone> IntervalStore<T> {
    /// Records overlapping `interval`
    ///
    /// **Public** - main query entry point
    ///
    /// # Arguments
    /// * `interval` - Query range; `None` returns a copy of the whole store
    /// * `trimmed` - Clip returned intervals to the query range
    ///
    /// # Returns
    /// A new store. Stored records are never modified; clipping only applies
    /// to the returned copies.
    pub fn slice(&self, interval: Option<&Interval>, trimmed: bool) -> IntervalStore<T> {
        let Some(query) = interval else {
            return self.clone();
        };

        let mut result = IntervalStore::new();
        for i in self.overlapping(query) {
            let record = &self.records[i];
            let clipped = if trimmed {
                record.interval.clip(query)
            } else {
                Some(record.interval)
            };
            // `overlapping` already guarantees a non-empty clip
            if let Some(interval) = clipped {
                result.append(IntervalRecord::new(interval, record.payload.clone()));
            }
        }
        result
    }

    /// Records whose payload satisfies `predicate`
    pub fn filter<F>(&self, mut predicate: F) -> IntervalStore<T>
    where
        F: FnMut(&T) -> bool,
    {
        self.records
            .iter()
            .filter(|r| predicate(&r.payload))
            .cloned()
            .collect()
    }
}

impl<T> FromIterator<IntervalRecord<T>> for IntervalStore<T> {
    fn from_iter<I: IntoIterator<Item = IntervalRecord<T>>>(iter: I) -> Self {
        let mut store = IntervalStore::new();
        for record in iter {
            store.append(record);
        }
        store
    }
}

impl<T> Extend<IntervalRecord<T>> for IntervalStore<T> {
    fn extend<I: IntoIterator<Item = IntervalRecord<T>>>(&mut self, iter: I) {
        for record in iter {
            self.append(record);
        }
    }
}

impl<T: Serialize> Serialize for IntervalStore<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for IntervalStore<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<IntervalRecord<T>>::deserialize(deserializer)?;
        Ok(records.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a IntervalStore<T> {
    type Item = &'a IntervalRecord<T>;
    type IntoIter = std::slice::Iter<'a, IntervalRecord<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<T> IntoIterator for IntervalStore<T> {
    type Item = IntervalRecord<T>;
    type IntoIter = std::vec::IntoIter<IntervalRecord<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
