//! Begin/end matching by explicit cookie.

use crate::containers::IntervalRecord;
use crate::model::Interval;
use crate::utils::error::IntervalError;
use log::warn;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Matches begin/end markers that carry an identifying key (e.g. a cookie)
///
/// At most one begin is pending per key. A second begin for a key that is
/// still open replaces the first one, which is then lost; this is logged.
#[derive(Debug)]
pub struct AsyncMatcher<K, B> {
    label: &'static str,
    pending: BTreeMap<K, (f64, B)>,
}

impl<K: Ord + Debug, B> AsyncMatcher<K, B> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            pending: BTreeMap::new(),
        }
    }

    pub fn begin(&mut self, key: K, timestamp: f64, payload: B) {
        if let Some((previous, _)) = self.pending.get(&key) {
            warn!(
                "{}: begin for {:?} at {:.6} replaces open begin at {:.6}",
                self.label, key, timestamp, previous
            );
        }
        self.pending.insert(key, (timestamp, payload));
    }

    /// Close the pending begin for `key`, if any
    ///
    /// # Errors
    /// * `IntervalError` - The end precedes its begin
    pub fn end(&mut self, key: &K, timestamp: f64) -> Result<Option<IntervalRecord<B>>, IntervalError> {
        let Some((start, payload)) = self.pending.remove(key) else {
            warn!(
                "{}: missing start marker for {:?} at {:.6}",
                self.label, key, timestamp
            );
            return Ok(None);
        };
        Ok(Some(IntervalRecord::new(Interval::new(start, timestamp)?, payload)))
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// True if a begin for `key` is waiting for its end
    pub fn is_open(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Close every pending begin at `duration`
    pub fn finish(self, duration: f64) -> Result<Vec<(K, IntervalRecord<B>)>, IntervalError> {
        self.pending
            .into_iter()
            .map(|(key, (start, payload))| {
                Ok((key, IntervalRecord::new(Interval::new(start, duration)?, payload)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_by_key_not_order() {
        let mut matcher = AsyncMatcher::new("test");
        matcher.begin(("launch", 1), 1.0, "first");
        matcher.begin(("launch", 2), 2.0, "second");

        let first = matcher.end(&("launch", 1), 5.0).unwrap().unwrap();
        assert_eq!(first.payload, "first");
        assert_eq!(first.interval, Interval::new(1.0, 5.0).unwrap());
        assert_eq!(matcher.pending(), 1);
    }

    #[test]
    fn test_second_begin_overwrites() {
        let mut matcher = AsyncMatcher::new("test");
        matcher.begin(7, 1.0, "old");
        matcher.begin(7, 2.0, "new");
        let record = matcher.end(&7, 3.0).unwrap().unwrap();
        assert_eq!(record.payload, "new");
        assert_eq!(record.start(), 2.0);
        assert!(matcher.end(&7, 4.0).unwrap().is_none());
    }

    #[test]
    fn test_finish_closes_open() {
        let mut matcher = AsyncMatcher::new("test");
        matcher.begin(1, 4.0, ());
        let closed = matcher.finish(10.0).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].1.interval, Interval::new(4.0, 10.0).unwrap());
    }
}
