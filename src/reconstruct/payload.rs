//! Interval kinds and the payloads reconstructed intervals carry.

use crate::model::{Task, TaskState};
use crate::utils::error::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every interval kind a component can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    /// Nested atrace `B`/`E` sections
    Section,
    /// Cookie-matched atrace `S`/`F` sections
    AsyncSection,
    /// atrace `C` counter values
    Counter,
    ClockFrequency,
    CpuFrequency,
    CpuIdle,
    /// A task occupying a CPU between two context switches
    TaskRun,
    Irq,
    Softirq,
    Workqueue,
    BusVote,
}

impl IntervalKind {
    pub const ALL: [IntervalKind; 11] = [
        IntervalKind::Section,
        IntervalKind::AsyncSection,
        IntervalKind::Counter,
        IntervalKind::ClockFrequency,
        IntervalKind::CpuFrequency,
        IntervalKind::CpuIdle,
        IntervalKind::TaskRun,
        IntervalKind::Irq,
        IntervalKind::Softirq,
        IntervalKind::Workqueue,
        IntervalKind::BusVote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalKind::Section => "section",
            IntervalKind::AsyncSection => "async_section",
            IntervalKind::Counter => "counter",
            IntervalKind::ClockFrequency => "clock_frequency",
            IntervalKind::CpuFrequency => "cpu_frequency",
            IntervalKind::CpuIdle => "cpu_idle",
            IntervalKind::TaskRun => "task_run",
            IntervalKind::Irq => "irq",
            IntervalKind::Softirq => "softirq",
            IntervalKind::Workqueue => "workqueue",
            IntervalKind::BusVote => "bus_vote",
        }
    }

    /// Record kinds that must be present in a trace to build this kind
    pub fn requires(&self) -> &'static [&'static str] {
        match self {
            IntervalKind::Section | IntervalKind::AsyncSection | IntervalKind::Counter => {
                &["tracing_mark_write"]
            }
            IntervalKind::ClockFrequency => &["clock_set_rate"],
            IntervalKind::CpuFrequency => &["cpu_frequency"],
            IntervalKind::CpuIdle => &["cpu_idle"],
            IntervalKind::TaskRun => &["sched_switch"],
            IntervalKind::Irq => &["irq_handler_entry"],
            IntervalKind::Softirq => &["softirq_entry"],
            IntervalKind::Workqueue => &["workqueue_execute_start"],
            IntervalKind::BusVote => &["bus_update_request"],
        }
    }

    /// Record kinds read while building this kind
    ///
    /// Handler exits are consumed but not required: entries left open
    /// are closed at the trace duration.
    pub fn consumes(&self) -> &'static [&'static str] {
        match self {
            IntervalKind::Irq => &["irq_handler_entry", "irq_handler_exit"],
            IntervalKind::Softirq => &["softirq_entry", "softirq_exit"],
            IntervalKind::Workqueue => &["workqueue_execute_start", "workqueue_execute_end"],
            other => other.requires(),
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntervalKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| QueryError::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpan {
    pub name: String,
    /// Process that wrote the marker
    pub pid: u32,
    /// Thread that wrote the marker
    pub tid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncSpan {
    pub name: String,
    pub pid: u32,
    pub cookie: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterLevel {
    pub name: String,
    pub pid: u32,
    /// `None` before the first recorded value
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockLevel {
    pub clock: String,
    /// Hz; `None` before the first recorded rate
    pub rate: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyLevel {
    pub cpu: u32,
    /// kHz; `None` before the first recorded frequency
    pub frequency: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleSpan {
    pub cpu: u32,
    pub state: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRun {
    pub cpu: u32,
    pub task: Task,
    /// State the task was switched out in, `None` if still running at trace end
    pub exit_state: Option<TaskState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrqSpan {
    pub cpu: u32,
    pub irq: u32,
    pub name: String,
    /// `None` if the handler had not returned at trace end
    pub handled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftirqSpan {
    pub cpu: u32,
    pub vec: u32,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSpan {
    pub cpu: u32,
    pub work: String,
    pub function: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusVote {
    pub src: u32,
    pub dest: u32,
    pub ab: u64,
    pub ib: u64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusLevel {
    pub device: String,
    /// `None` before the first recorded vote
    pub vote: Option<BusVote>,
}

/// Payload of a reconstructed interval, one variant per interval kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum IntervalPayload {
    Section(SectionSpan),
    AsyncSection(AsyncSpan),
    Counter(CounterLevel),
    ClockFrequency(ClockLevel),
    CpuFrequency(FrequencyLevel),
    CpuIdle(IdleSpan),
    TaskRun(TaskRun),
    Irq(IrqSpan),
    Softirq(SoftirqSpan),
    Workqueue(WorkSpan),
    BusVote(BusLevel),
}

impl IntervalPayload {
    pub fn kind(&self) -> IntervalKind {
        match self {
            IntervalPayload::Section(_) => IntervalKind::Section,
            IntervalPayload::AsyncSection(_) => IntervalKind::AsyncSection,
            IntervalPayload::Counter(_) => IntervalKind::Counter,
            IntervalPayload::ClockFrequency(_) => IntervalKind::ClockFrequency,
            IntervalPayload::CpuFrequency(_) => IntervalKind::CpuFrequency,
            IntervalPayload::CpuIdle(_) => IntervalKind::CpuIdle,
            IntervalPayload::TaskRun(_) => IntervalKind::TaskRun,
            IntervalPayload::Irq(_) => IntervalKind::Irq,
            IntervalPayload::Softirq(_) => IntervalKind::Softirq,
            IntervalPayload::Workqueue(_) => IntervalKind::Workqueue,
            IntervalPayload::BusVote(_) => IntervalKind::BusVote,
        }
    }

    /// Human-readable name used for substring matching
    pub fn label(&self) -> String {
        match self {
            IntervalPayload::Section(s) => s.name.clone(),
            IntervalPayload::AsyncSection(s) => s.name.clone(),
            IntervalPayload::Counter(c) => c.name.clone(),
            IntervalPayload::ClockFrequency(c) => c.clock.clone(),
            IntervalPayload::CpuFrequency(f) => format!("cpu{}", f.cpu),
            IntervalPayload::CpuIdle(i) => format!("cpu{}", i.cpu),
            IntervalPayload::TaskRun(r) => r.task.name.clone(),
            IntervalPayload::Irq(i) => i.name.clone(),
            IntervalPayload::Softirq(s) => s.action.clone(),
            IntervalPayload::Workqueue(w) => w.function.clone(),
            IntervalPayload::BusVote(b) => b.device.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in IntervalKind::ALL {
            assert_eq!(kind.as_str().parse::<IntervalKind>().unwrap(), kind);
        }
        assert_eq!(
            "frames".parse::<IntervalKind>(),
            Err(QueryError::UnknownKind("frames".to_string()))
        );
    }

    #[test]
    fn test_payload_label() {
        let payload = IntervalPayload::CpuIdle(IdleSpan { cpu: 3, state: 1 });
        assert_eq!(payload.kind(), IntervalKind::CpuIdle);
        assert_eq!(payload.label(), "cpu3");
    }

    #[test]
    fn test_handler_kinds_require_entry_only() {
        assert_eq!(IntervalKind::Irq.requires(), &["irq_handler_entry"]);
        assert_eq!(
            IntervalKind::Workqueue.consumes(),
            &["workqueue_execute_start", "workqueue_execute_end"]
        );
        for kind in IntervalKind::ALL {
            for required in kind.requires() {
                assert!(kind.consumes().contains(required), "{} {}", kind, required);
            }
        }
    }
}
