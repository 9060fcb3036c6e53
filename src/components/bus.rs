//! Bus bandwidth votes from `bus_update_request`.

use crate::decoders::Payload;
use crate::model::Event;
use crate::reconstruct::{
    BusLevel, BusVote, IntervalCatalog, IntervalKind, IntervalPayload, LevelMatcher,
    Reconstructor,
};
use crate::utils::error::IntervalError;
use log::warn;

/// Vote in force for each bus client over time, stored by client name
pub struct BusComponent {
    votes: LevelMatcher<String, BusVote>,
    catalog: IntervalCatalog,
}

impl BusComponent {
    pub fn new() -> Self {
        let mut catalog = IntervalCatalog::new();
        catalog.declare(IntervalKind::BusVote);
        Self {
            votes: LevelMatcher::new(0.0),
            catalog,
        }
    }
}

impl Default for BusComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconstructor for BusComponent {
    fn name(&self) -> &'static str {
        "bus"
    }

    fn feed(&mut self, event: &Event) -> Result<(), IntervalError> {
        let Payload::BusUpdateRequest(request) = &event.payload else {
            warn!("Unsupported event: {} at {:.6}", event.kind, event.timestamp);
            return Ok(());
        };

        let vote = BusVote {
            src: request.src,
            dest: request.dest,
            ab: request.ab,
            ib: request.ib,
            active: request.active,
        };
        // The event was moved to the request's own timestamp while parsing
        if let Some(record) = self.votes.change(request.name.clone(), event.timestamp, vote)? {
            let level = record.map(|vote| {
                IntervalPayload::BusVote(BusLevel {
                    device: request.name.clone(),
                    vote,
                })
            });
            self.catalog.insert(request.name.clone(), level);
        }
        Ok(())
    }

    fn finish(self: Box<Self>, duration: f64) -> Result<IntervalCatalog, IntervalError> {
        let mut catalog = self.catalog;
        for (device, record) in self.votes.finish(duration)? {
            let level = record.map(|vote| {
                IntervalPayload::BusVote(BusLevel {
                    device: device.clone(),
                    vote,
                })
            });
            catalog.insert(device, level);
        }
        Ok(catalog)
    }
}
