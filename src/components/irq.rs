//! Hard irq, softirq and workqueue handler spans.

use crate::decoders::Payload;
use crate::model::Event;
use crate::reconstruct::{
    IntervalCatalog, IntervalKind, IntervalPayload, IrqSpan, PairedMatcher, Reconstructor,
    SoftirqSpan, WorkSpan,
};
use crate::utils::error::IntervalError;
use log::warn;

/// Rebuilds `irq`, `softirq` and `workqueue` intervals
///
/// Handlers are matched per `(cpu, line)` or `(cpu, work struct)` and stored
/// by irq number, softirq action and work function respectively.
pub struct IrqComponent {
    irqs: PairedMatcher<(u32, u32), IrqSpan>,
    softirqs: PairedMatcher<(u32, u32), SoftirqSpan>,
    works: PairedMatcher<(u32, String), WorkSpan>,
    catalog: IntervalCatalog,
}

impl IrqComponent {
    pub fn new() -> Self {
        let mut catalog = IntervalCatalog::new();
        catalog.declare(IntervalKind::Irq);
        catalog.declare(IntervalKind::Softirq);
        catalog.declare(IntervalKind::Workqueue);

        Self {
            irqs: PairedMatcher::new("irq"),
            softirqs: PairedMatcher::new("softirq"),
            works: PairedMatcher::new("workqueue"),
            catalog,
        }
    }
}

impl Default for IrqComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconstructor for IrqComponent {
    fn name(&self) -> &'static str {
        "irq"
    }

    fn feed(&mut self, event: &Event) -> Result<(), IntervalError> {
        let cpu = event.cpu;
        let ts = event.timestamp;

        match &event.payload {
            Payload::IrqHandlerEntry(entry) => {
                let span = IrqSpan {
                    cpu,
                    irq: entry.irq,
                    name: entry.name.clone(),
                    handled: None,
                };
                self.irqs.begin((cpu, entry.irq), ts, span);
            }
            Payload::IrqHandlerExit(exit) => {
                if let Some(mut record) = self.irqs.end(&(cpu, exit.irq), ts)? {
                    record.payload.handled = Some(exit.handled);
                    self.catalog
                        .insert(exit.irq.to_string(), record.map(IntervalPayload::Irq));
                }
            }
            Payload::SoftirqEntry(softirq) => {
                let span = SoftirqSpan {
                    cpu,
                    vec: softirq.vec,
                    action: softirq.action.clone(),
                };
                self.softirqs.begin((cpu, softirq.vec), ts, span);
            }
            Payload::SoftirqExit(softirq) => {
                if let Some(record) = self.softirqs.end(&(cpu, softirq.vec), ts)? {
                    let key = record.payload.action.clone();
                    self.catalog.insert(key, record.map(IntervalPayload::Softirq));
                }
            }
            Payload::WorkqueueExecuteStart(work) => {
                let span = WorkSpan {
                    cpu,
                    work: work.work.clone(),
                    function: work.function.clone(),
                };
                self.works.begin((cpu, work.work.clone()), ts, span);
            }
            Payload::WorkqueueExecuteEnd(work) => {
                if let Some(record) = self.works.end(&(cpu, work.work.clone()), ts)? {
                    let key = record.payload.function.clone();
                    self.catalog.insert(key, record.map(IntervalPayload::Workqueue));
                }
            }
            _ => warn!("Unsupported event: {} at {:.6}", event.kind, ts),
        }
        Ok(())
    }

    fn finish(self: Box<Self>, duration: f64) -> Result<IntervalCatalog, IntervalError> {
        let mut catalog = self.catalog;

        for ((_, irq), record) in self.irqs.finish(duration)? {
            catalog.insert(irq.to_string(), record.map(IntervalPayload::Irq));
        }
        for (_, record) in self.softirqs.finish(duration)? {
            let key = record.payload.action.clone();
            catalog.insert(key, record.map(IntervalPayload::Softirq));
        }
        for (_, record) in self.works.finish(duration)? {
            let key = record.payload.function.clone();
            catalog.insert(key, record.map(IntervalPayload::Workqueue));
        }

        Ok(catalog)
    }
}
