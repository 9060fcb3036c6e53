//! Per-CPU frequency, idle residency and task occupancy.

use crate::containers::IntervalRecord;
use crate::decoders::Payload;
use crate::model::{Event, Task};
use crate::reconstruct::{
    AsyncMatcher, FrequencyLevel, IdleSpan, IntervalCatalog, IntervalKind, IntervalPayload,
    LevelMatcher, Reconstructor, TaskRun,
};
use crate::utils::error::IntervalError;
use log::warn;

/// Rebuilds `cpu_frequency`, `cpu_idle` and `task_run` intervals
///
/// All three are stored by cpu number.
pub struct CpuComponent {
    frequencies: LevelMatcher<u32, u64>,
    idle: AsyncMatcher<u32, IdleSpan>,
    running: LevelMatcher<u32, Task>,
    catalog: IntervalCatalog,
}

impl CpuComponent {
    pub fn new() -> Self {
        let mut catalog = IntervalCatalog::new();
        catalog.declare(IntervalKind::CpuFrequency);
        catalog.declare(IntervalKind::CpuIdle);
        catalog.declare(IntervalKind::TaskRun);

        Self {
            frequencies: LevelMatcher::new(0.0),
            idle: AsyncMatcher::new("cpu_idle"),
            running: LevelMatcher::new(0.0),
            catalog,
        }
    }

    fn on_idle(&mut self, cpu: u32, state: u32, exit: bool, timestamp: f64) -> Result<(), IntervalError> {
        // A deeper state entered without an exit ends the current residency
        if exit || self.idle.is_open(&cpu) {
            if let Some(record) = self.idle.end(&cpu, timestamp)? {
                self.catalog
                    .insert(cpu.to_string(), record.map(IntervalPayload::CpuIdle));
            }
        }
        if !exit {
            self.idle.begin(cpu, timestamp, IdleSpan { cpu, state });
        }
        Ok(())
    }
}

impl Default for CpuComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconstructor for CpuComponent {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn feed(&mut self, event: &Event) -> Result<(), IntervalError> {
        match &event.payload {
            Payload::CpuFrequency(freq) => {
                let cpu = freq.cpu_id;
                if let Some(record) = self.frequencies.change(cpu, event.timestamp, freq.state)? {
                    let level = record.map(|frequency| {
                        IntervalPayload::CpuFrequency(FrequencyLevel { cpu, frequency })
                    });
                    self.catalog.insert(cpu.to_string(), level);
                }
            }
            Payload::CpuIdle(idle) => {
                self.on_idle(idle.cpu_id, idle.state, idle.is_exit(), event.timestamp)?;
            }
            Payload::SchedSwitch(switch) => {
                let cpu = event.cpu;
                let ended = self.running.change(cpu, event.timestamp, switch.next_task())?;
                if let Some(record) = ended {
                    // Before the first switch the outgoing task is the only
                    // one known to have been running
                    let run = record.map(|task| {
                        IntervalPayload::TaskRun(TaskRun {
                            cpu,
                            task: task.unwrap_or_else(|| switch.prev_task()),
                            exit_state: Some(switch.prev_state),
                        })
                    });
                    self.catalog.insert(cpu.to_string(), run);
                }
            }
            _ => warn!("Unsupported event: {} at {:.6}", event.kind, event.timestamp),
        }
        Ok(())
    }

    fn finish(self: Box<Self>, duration: f64) -> Result<IntervalCatalog, IntervalError> {
        let mut catalog = self.catalog;

        for (cpu, record) in self.frequencies.finish(duration)? {
            let level =
                record.map(|frequency| IntervalPayload::CpuFrequency(FrequencyLevel { cpu, frequency }));
            catalog.insert(cpu.to_string(), level);
        }
        for (cpu, record) in self.idle.finish(duration)? {
            catalog.insert(cpu.to_string(), record.map(IntervalPayload::CpuIdle));
        }
        for (cpu, record) in self.running.finish(duration)? {
            // Closure always carries the last task switched in
            let IntervalRecord {
                interval,
                payload: Some(task),
            } = record
            else {
                continue;
            };
            let run = TaskRun {
                cpu,
                task,
                exit_state: None,
            };
            catalog.insert(
                cpu.to_string(),
                IntervalRecord::new(interval, IntervalPayload::TaskRun(run)),
            );
        }

        Ok(catalog)
    }
}
