//! Level-change matching: each new value closes the span of the previous one.

use crate::containers::IntervalRecord;
use crate::model::Interval;
use crate::utils::error::IntervalError;
use std::collections::BTreeMap;

/// Turns discrete value changes into spans of constant value
///
/// Traces only record changes, so the value in force before a key's first
/// change is unknown. That first span carries `None`; every later span carries
/// `Some(previous value)`.
#[derive(Debug)]
pub struct LevelMatcher<K, V> {
    /// Start of the unknown-value span for keys not seen yet
    origin: f64,
    last: BTreeMap<K, (f64, V)>,
}

impl<K: Ord, V> LevelMatcher<K, V> {
    /// `origin` is where the first, unknown-value span of each key begins
    pub fn new(origin: f64) -> Self {
        Self {
            origin,
            last: BTreeMap::new(),
        }
    }

    /// Record that `key` changed to `value` at `timestamp`
    ///
    /// # Returns
    /// The span that just ended, holding the previous value. For a key's
    /// first change this is the unknown-value span from `origin`, skipped when
    /// it would be empty.
    ///
    /// # Errors
    /// * `IntervalError` - `timestamp` precedes the key's previous change
    pub fn change(
        &mut self,
        key: K,
        timestamp: f64,
        value: V,
    ) -> Result<Option<IntervalRecord<Option<V>>>, IntervalError> {
        let ended = match self.last.insert(key, (timestamp, value)) {
            Some((since, previous)) => {
                Some(IntervalRecord::new(Interval::new(since, timestamp)?, Some(previous)))
            }
            None if timestamp > self.origin => {
                Some(IntervalRecord::new(Interval::new(self.origin, timestamp)?, None))
            }
            None => None,
        };
        Ok(ended)
    }

    /// Last value seen for `key`
    pub fn current(&self, key: &K) -> Option<&V> {
        self.last.get(key).map(|(_, value)| value)
    }

    /// Close each key's last value at `duration`
    ///
    /// **Public** - end-of-stream closure, called once after the last event
    pub fn finish(self, duration: f64) -> Result<Vec<(K, IntervalRecord<Option<V>>)>, IntervalError> {
        self.last
            .into_iter()
            .map(|(key, (since, value))| {
                Ok((key, IntervalRecord::new(Interval::new(since, duration)?, Some(value))))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_value_held_until_change() {
        let mut matcher = LevelMatcher::new(0.0);
        let unknown = matcher.change("X", 0.5, 100).unwrap().unwrap();
        assert_eq!(unknown.interval, Interval::new(0.0, 0.5).unwrap());
        assert_eq!(unknown.payload, None);

        let held = matcher.change("X", 2.0, 200).unwrap().unwrap();
        assert_eq!(held.interval, Interval::new(0.5, 2.0).unwrap());
        assert_eq!(held.payload, Some(100));

        let closed = matcher.finish(5.0).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].1.interval, Interval::new(2.0, 5.0).unwrap());
        assert_eq!(closed[0].1.payload, Some(200));
    }

    #[test]
    fn test_change_at_origin_has_no_unknown_span() {
        let mut matcher = LevelMatcher::new(0.0);
        assert!(matcher.change(1, 0.0, 'a').unwrap().is_none());
        assert_eq!(matcher.current(&1), Some(&'a'));
    }

    #[test]
    fn test_backwards_change_is_error() {
        let mut matcher = LevelMatcher::new(0.0);
        matcher.change(1, 3.0, 1).unwrap();
        assert!(matcher.change(1, 2.0, 2).is_err());
    }
}
