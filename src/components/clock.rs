//! Clock tree rates from `clock_set_rate`.

use crate::decoders::Payload;
use crate::model::Event;
use crate::reconstruct::{
    ClockLevel, IntervalCatalog, IntervalKind, IntervalPayload, LevelMatcher, Reconstructor,
};
use crate::utils::error::IntervalError;
use log::warn;

/// Frequency of each clock over time, stored by clock name
pub struct ClockComponent {
    rates: LevelMatcher<String, u64>,
    catalog: IntervalCatalog,
}

impl ClockComponent {
    pub fn new() -> Self {
        let mut catalog = IntervalCatalog::new();
        catalog.declare(IntervalKind::ClockFrequency);
        Self {
            rates: LevelMatcher::new(0.0),
            catalog,
        }
    }
}

impl Default for ClockComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconstructor for ClockComponent {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn feed(&mut self, event: &Event) -> Result<(), IntervalError> {
        let Payload::ClockSetRate(clock) = &event.payload else {
            warn!("Unsupported event: {} at {:.6}", event.kind, event.timestamp);
            return Ok(());
        };

        if let Some(record) = self.rates.change(clock.clk.clone(), event.timestamp, clock.state)? {
            let level = record.map(|rate| {
                IntervalPayload::ClockFrequency(ClockLevel {
                    clock: clock.clk.clone(),
                    rate,
                })
            });
            self.catalog.insert(clock.clk.clone(), level);
        }
        Ok(())
    }

    fn finish(self: Box<Self>, duration: f64) -> Result<IntervalCatalog, IntervalError> {
        let mut catalog = self.catalog;
        for (clock, record) in self.rates.finish(duration)? {
            let level = record.map(|rate| {
                IntervalPayload::ClockFrequency(ClockLevel {
                    clock: clock.clone(),
                    rate,
                })
            });
            catalog.insert(clock, level);
        }
        Ok(catalog)
    }
}
