//! Closed time ranges, in seconds relative to the start of the trace.

use crate::utils::error::IntervalError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed time range `[start, end]`
///
/// Immutable once built; `end >= start` always holds, including for values
/// read back from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: f64,
    end: f64,
}

impl Interval {
    /// Create a new interval
    ///
    /// **Public** - the only way to build an interval
    ///
    /// # Errors
    /// * `IntervalError` - `end` is less than `start` (or either is NaN)
    pub fn new(start: f64, end: f64) -> Result<Self, IntervalError> {
        // Written this way so NaN fails too
        if !(end >= start) {
            return Err(IntervalError { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True if `timestamp` falls inside the closed range
    pub fn contains(&self, timestamp: f64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }

    /// True if the two closed ranges share at least one point
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Clip to `bounds`, or `None` when the ranges do not overlap
    pub fn clip(&self, bounds: &Interval) -> Option<Interval> {
        if !self.overlaps(bounds) {
            return None;
        }
        Some(Interval {
            start: self.start.max(bounds.start),
            end: self.end.min(bounds.end),
        })
    }
}

#[derive(Deserialize)]
struct RawInterval {
    start: f64,
    end: f64,
}

impl TryFrom<RawInterval> for Interval {
    type Error = IntervalError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Interval::new(raw.start, raw.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Interval(start={:.3}ms, end={:.3}ms, duration={:.3}ms)",
            self.start * 1000.0,
            self.end * 1000.0,
            self.duration() * 1000.0
        )
    }
}
