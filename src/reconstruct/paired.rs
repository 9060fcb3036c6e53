//! Begin/end matching with per-key LIFO nesting.

use crate::containers::IntervalRecord;
use crate::model::Interval;
use crate::utils::error::IntervalError;
use log::warn;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Matches nested begin/end markers per key
///
/// Each key owns a stack of pending begins. An end closes the most recent
/// begin for its key; an end with nothing pending is logged and dropped.
/// Whatever is still pending at `finish` is closed at the trace duration.
#[derive(Debug)]
pub struct PairedMatcher<K, B> {
    label: &'static str,
    pending: BTreeMap<K, Vec<(f64, B)>>,
}

impl<K: Ord + Debug, B> PairedMatcher<K, B> {
    /// `label` names the matcher in log messages
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            pending: BTreeMap::new(),
        }
    }

    pub fn begin(&mut self, key: K, timestamp: f64, payload: B) {
        self.pending.entry(key).or_default().push((timestamp, payload));
    }

    /// Close the innermost pending begin for `key`
    ///
    /// # Returns
    /// The closed interval carrying the begin payload, or `None` for an end
    /// marker with no pending begin
    ///
    /// # Errors
    /// * `IntervalError` - The end precedes its begin
    pub fn end(&mut self, key: &K, timestamp: f64) -> Result<Option<IntervalRecord<B>>, IntervalError> {
        let Some((start, payload)) = self.pending.get_mut(key).and_then(Vec::pop) else {
            warn!(
                "{}: missing start marker for {:?} at {:.6}",
                self.label, key, timestamp
            );
            return Ok(None);
        };
        Ok(Some(IntervalRecord::new(Interval::new(start, timestamp)?, payload)))
    }

    /// Number of begins still waiting for an end
    pub fn pending(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Close every pending begin at `duration`
    ///
    /// **Public** - end-of-stream closure, called once after the last event
    pub fn finish(self, duration: f64) -> Result<Vec<(K, IntervalRecord<B>)>, IntervalError>
    where
        K: Clone,
    {
        let mut closed = Vec::new();
        for (key, stack) in self.pending {
            for (start, payload) in stack {
                closed.push((
                    key.clone(),
                    IntervalRecord::new(Interval::new(start, duration)?, payload),
                ));
            }
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_pairs_close_innermost_first() {
        let mut matcher = PairedMatcher::new("test");
        matcher.begin(1, 1.0, "outer");
        matcher.begin(1, 2.0, "inner");

        let inner = matcher.end(&1, 3.0).unwrap().unwrap();
        assert_eq!(inner.payload, "inner");
        assert_eq!(inner.interval, Interval::new(2.0, 3.0).unwrap());

        let outer = matcher.end(&1, 4.0).unwrap().unwrap();
        assert_eq!(outer.payload, "outer");
        assert_eq!(matcher.pending(), 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut matcher = PairedMatcher::new("test");
        matcher.begin(1, 1.0, "a");
        assert!(matcher.end(&2, 1.5).unwrap().is_none());
        assert_eq!(matcher.pending(), 1);
    }

    #[test]
    fn test_end_before_begin_is_error() {
        let mut matcher = PairedMatcher::new("test");
        matcher.begin(1, 5.0, ());
        assert!(matcher.end(&1, 4.0).is_err());
    }
}
