//! Android atrace sections, async sections and counters.

use crate::decoders::{AtraceMark, Payload};
use crate::model::Event;
use crate::reconstruct::{
    AsyncMatcher, AsyncSpan, CounterLevel, IntervalCatalog, IntervalKind, IntervalPayload,
    LevelMatcher, PairedMatcher, Reconstructor, SectionSpan,
};
use crate::utils::error::IntervalError;
use log::warn;

/// Rebuilds `tracing_mark_write` intervals
///
/// Sections nest per writing thread; async sections match on
/// `(pid, name, cookie)`; counters change level per `(pid, name)`. All three
/// are stored by section or counter name.
pub struct AndroidComponent {
    sections: PairedMatcher<u32, SectionSpan>,
    async_sections: AsyncMatcher<(u32, String, i64), AsyncSpan>,
    counters: LevelMatcher<(u32, String), i64>,
    catalog: IntervalCatalog,
}

impl AndroidComponent {
    pub fn new() -> Self {
        let mut catalog = IntervalCatalog::new();
        catalog.declare(IntervalKind::Section);
        catalog.declare(IntervalKind::AsyncSection);
        catalog.declare(IntervalKind::Counter);

        Self {
            sections: PairedMatcher::new("section"),
            async_sections: AsyncMatcher::new("async_section"),
            counters: LevelMatcher::new(0.0),
            catalog,
        }
    }
}

impl Default for AndroidComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconstructor for AndroidComponent {
    fn name(&self) -> &'static str {
        "android"
    }

    fn feed(&mut self, event: &Event) -> Result<(), IntervalError> {
        let Payload::TracingMarkWrite(mark) = &event.payload else {
            warn!("Unsupported event: {} at {:.6}", event.kind, event.timestamp);
            return Ok(());
        };
        let tid = event.task.pid;

        match mark {
            AtraceMark::Begin { pid, name } => {
                let span = SectionSpan {
                    name: name.clone(),
                    pid: *pid,
                    tid,
                };
                self.sections.begin(tid, event.timestamp, span);
            }
            AtraceMark::End { .. } => {
                if let Some(record) = self.sections.end(&tid, event.timestamp)? {
                    let key = record.payload.name.clone();
                    self.catalog.insert(key, record.map(IntervalPayload::Section));
                }
            }
            AtraceMark::AsyncBegin { pid, name, cookie } => {
                let span = AsyncSpan {
                    name: name.clone(),
                    pid: *pid,
                    cookie: *cookie,
                };
                self.async_sections
                    .begin((*pid, name.clone(), *cookie), event.timestamp, span);
            }
            AtraceMark::AsyncEnd { pid, name, cookie } => {
                let key = (*pid, name.clone(), *cookie);
                if let Some(record) = self.async_sections.end(&key, event.timestamp)? {
                    self.catalog
                        .insert(name.clone(), record.map(IntervalPayload::AsyncSection));
                }
            }
            AtraceMark::Counter { pid, name, value } => {
                let key = (*pid, name.clone());
                if let Some(record) = self.counters.change(key, event.timestamp, *value)? {
                    let level = record.map(|value| {
                        IntervalPayload::Counter(CounterLevel {
                            name: name.clone(),
                            pid: *pid,
                            value,
                        })
                    });
                    self.catalog.insert(name.clone(), level);
                }
            }
        }
        Ok(())
    }

    fn finish(self: Box<Self>, duration: f64) -> Result<IntervalCatalog, IntervalError> {
        let mut catalog = self.catalog;

        for (_, record) in self.sections.finish(duration)? {
            let key = record.payload.name.clone();
            catalog.insert(key, record.map(IntervalPayload::Section));
        }
        for ((_, name, _), record) in self.async_sections.finish(duration)? {
            catalog.insert(name, record.map(IntervalPayload::AsyncSection));
        }
        for ((pid, name), record) in self.counters.finish(duration)? {
            let level = record.map(|value| {
                IntervalPayload::Counter(CounterLevel {
                    name: name.clone(),
                    pid,
                    value,
                })
            });
            catalog.insert(name, level);
        }

        Ok(catalog)
    }
}
