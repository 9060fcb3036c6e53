//! K-way merge across independently sorted containers.
//!
//! Used when a query spans every key of an interval kind: each per-key store
//! is already sorted by start, so a heap over the current head of each source
//! yields one time-ordered sequence without sorting everything again.

use super::interval_store::{IntervalRecord, IntervalStore};
use crate::model::{Event, Interval};
use crate::utils::error::MergeError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Anything with a timestamp the merge can order by
pub trait Timestamped {
    /// Ordering key in seconds, `None` if the element has no usable key
    fn ordering_key(&self) -> Option<f64>;
}

impl Timestamped for Event {
    fn ordering_key(&self) -> Option<f64> {
        self.timestamp.is_finite().then_some(self.timestamp)
    }
}

impl Timestamped for Interval {
    fn ordering_key(&self) -> Option<f64> {
        Some(self.start())
    }
}

impl<T> Timestamped for IntervalRecord<T> {
    fn ordering_key(&self) -> Option<f64> {
        Some(self.start())
    }
}

impl Timestamped for f64 {
    fn ordering_key(&self) -> Option<f64> {
        self.is_finite().then_some(*self)
    }
}

/// Head of one source inside the heap
#[derive(Debug, Clone, Copy)]
struct Head {
    key: f64,
    source: usize,
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    // Reversed: `BinaryHeap` is a max-heap. Ties go to the earlier source.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// Lazy, time-ordered iterator over several sorted slices
#[derive(Debug)]
pub struct SortedMerge<'a, T> {
    sources: Vec<&'a [T]>,
    positions: Vec<usize>,
    heap: BinaryHeap<Head>,
    remaining: usize,
}

impl<'a, T: Timestamped> SortedMerge<'a, T> {
    /// Prepare a merge over `sources`
    ///
    /// **Public** - inputs are checked up front so iteration cannot fail
    ///
    /// # Errors
    /// * `MergeError::MissingOrderingKey` - An element has no ordering key
    /// * `MergeError::Unsorted` - A source is not sorted by ordering key
    pub fn new(sources: Vec<&'a [T]>) -> Result<Self, MergeError> {
        let mut heap = BinaryHeap::with_capacity(sources.len());

        for (index, source) in sources.iter().enumerate() {
            let mut previous = f64::NEG_INFINITY;
            for (position, element) in source.iter().enumerate() {
                let key =
                    element
                        .ordering_key()
                        .ok_or_else(|| MergeError::MissingOrderingKey {
                            index,
                            reason: format!("element {} has no finite timestamp", position),
                        })?;
                if key < previous {
                    return Err(MergeError::Unsorted { index, position });
                }
                previous = key;
            }

            if let Some(key) = source.first().and_then(Timestamped::ordering_key) {
                heap.push(Head { key, source: index });
            }
        }

        Ok(Self {
            positions: vec![0; sources.len()],
            remaining: sources.iter().map(|s| s.len()).sum(),
            sources,
            heap,
        })
    }
}

impl<'a, T: Timestamped> Iterator for SortedMerge<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let head = self.heap.pop()?;
        let source = self.sources[head.source];
        let position = self.positions[head.source];
        let item = &source[position];

        self.positions[head.source] = position + 1;
        self.remaining -= 1;
        if let Some(key) = source.get(position + 1).and_then(Timestamped::ordering_key) {
            self.heap.push(Head {
                key,
                source: head.source,
            });
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T: Timestamped> ExactSizeIterator for SortedMerge<'a, T> {}

/// Merge several interval stores into one start-ordered store
///
/// **Public** - backs "all keys" interval queries
///
/// # Errors
/// * `MergeError` - Propagated from `SortedMerge::new`
pub fn merge_stores<'a, T, I>(stores: I) -> Result<IntervalStore<T>, MergeError>
where
    T: Clone + 'a,
    I: IntoIterator<Item = &'a IntervalStore<T>>,
{
    let sources: Vec<&[IntervalRecord<T>]> = stores.into_iter().map(|s| s.records()).collect();
    Ok(SortedMerge::new(sources)?.cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_interleaves() {
        let a = [1.0, 4.0, 7.0];
        let b = [2.0, 3.0, 8.0];
        let c: [f64; 0] = [];
        let merged: Vec<f64> = SortedMerge::new(vec![&a[..], &b[..], &c[..]])
            .unwrap()
            .copied()
            .collect();
        assert_eq!(merged, vec![1.0, 2.0, 3.0, 4.0, 7.0, 8.0]);
    }

    #[test]
    fn test_ties_prefer_earlier_source() {
        let a = [IntervalRecord::new(Interval::new(1.0, 2.0).unwrap(), "a")];
        let b = [IntervalRecord::new(Interval::new(1.0, 3.0).unwrap(), "b")];
        let order: Vec<&str> = SortedMerge::new(vec![&b[..], &a[..]])
            .unwrap()
            .map(|r| r.payload)
            .collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_rejects_missing_key() {
        let bad = [1.0, f64::NAN];
        let err = SortedMerge::new(vec![&bad[..]]).unwrap_err();
        assert!(matches!(err, MergeError::MissingOrderingKey { index: 0, .. }));
    }

    #[test]
    fn test_rejects_unsorted_source() {
        let good = [1.0];
        let bad = [3.0, 2.0];
        let err = SortedMerge::new(vec![&good[..], &bad[..]]).unwrap_err();
        assert_eq!(err, MergeError::Unsorted { index: 1, position: 1 });
    }

    #[test]
    fn test_size_hint_is_exact() {
        let a = [1.0, 2.0];
        let b = [0.5];
        let mut merge = SortedMerge::new(vec![&a[..], &b[..]]).unwrap();
        assert_eq!(merge.len(), 3);
        merge.next();
        assert_eq!(merge.len(), 2);
    }
}
