//! A single record written to the trace buffer.

use super::task::Task;
use crate::decoders::Payload;
use serde::{Deserialize, Serialize};

/// Interrupt context a record was logged from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrqContext {
    /// `.` - normal context
    Normal,
    /// `h` - hard irq is running
    HardIrq,
    /// `s` - soft irq is running
    SoftIrq,
    /// `H` - hard irq occurred inside a softirq
    HardInSoft,
}

/// Scheduler-state flags from the `||||` latency columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFlags {
    pub irqs_off: bool,
    pub need_resched: bool,
    pub irq_context: IrqContext,
    /// `None` when the column shows `.`
    pub preempt_depth: Option<u8>,
}

impl EventFlags {
    /// Decode the four flag characters, e.g. `d.h2`
    ///
    /// Returns `None` when fewer than four characters are present.
    pub fn parse(flags: &str) -> Option<Self> {
        let mut chars = flags.chars();
        let irqs_off = matches!(chars.next()?, 'd' | 'X');
        let need_resched = matches!(chars.next()?, 'N' | 'n' | 'p');
        let irq_context = match chars.next()? {
            'h' => IrqContext::HardIrq,
            's' => IrqContext::SoftIrq,
            'H' => IrqContext::HardInSoft,
            _ => IrqContext::Normal,
        };
        let preempt_depth = chars
            .next()?
            .to_digit(16)
            .and_then(|depth| u8::try_from(depth).ok());

        Some(Self {
            irqs_off,
            need_resched,
            irq_context,
            preempt_depth,
        })
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self {
            irqs_off: false,
            need_resched: false,
            irq_context: IrqContext::Normal,
            preempt_depth: None,
        }
    }
}

/// Generic envelope around one decoded trace record
///
/// Immutable once built by the tokenizer. Matching between records is by
/// `(kind, payload key fields)`, never by identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Task that was current when the record was logged
    pub task: Task,

    /// CPU the record was logged on
    pub cpu: u32,

    /// Timestamp as printed in the file
    pub raw_timestamp: f64,

    /// Seconds since the first record of the trace
    pub timestamp: f64,

    pub flags: EventFlags,

    /// Record kind (tracepoint name), e.g. `sched_switch`
    pub kind: String,

    /// Decoded payload, or raw text when no decoder applied
    pub payload: Payload,
}

impl Event {
    /// True if this record was logged by `task` (compared by pid)
    pub fn is_from(&self, task: &Task) -> bool {
        self.task == *task
    }
}
