//! Interrupt and deferred-work record kinds.

use super::{captures, field, text, Payload};
use crate::utils::error::DecodeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static IRQ_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^irq=(?P<irq>\d+)\s+name=(?P<name>.+)").expect("Invalid irq entry regex pattern")
});

static IRQ_EXIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^irq=(?P<irq>\d+)\s+ret=(?P<ret>\w+)").expect("Invalid irq exit regex pattern")
});

static SOFTIRQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^vec=(?P<vec>\d+)\s+\[action=(?P<action>[^\]]+)\]")
        .expect("Invalid softirq regex pattern")
});

static WORK_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^work struct:?\s*(?P<work>[^:\s]+):?\s+function\s+(?P<function>\S+)")
        .expect("Invalid workqueue start regex pattern")
});

static WORK_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^work struct:?\s*(?P<work>[^:\s]+)").expect("Invalid workqueue end regex pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrqHandlerEntry {
    pub irq: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrqHandlerExit {
    pub irq: u32,
    /// `true` when the handler returned `handled`
    pub handled: bool,
}

/// Payload shared by `softirq_entry` and `softirq_exit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Softirq {
    pub vec: u32,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkqueueStart {
    pub work: String,
    pub function: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkqueueEnd {
    pub work: String,
}

pub fn decode_irq_handler_entry(payload: &str) -> Result<Payload, DecodeError> {
    const KIND: &str = "irq_handler_entry";
    let caps = captures(&IRQ_ENTRY_RE, KIND, payload)?;
    Ok(Payload::IrqHandlerEntry(IrqHandlerEntry {
        irq: field(&caps, KIND, "irq")?,
        name: text(&caps, "name"),
    }))
}

pub fn decode_irq_handler_exit(payload: &str) -> Result<Payload, DecodeError> {
    const KIND: &str = "irq_handler_exit";
    let caps = captures(&IRQ_EXIT_RE, KIND, payload)?;
    Ok(Payload::IrqHandlerExit(IrqHandlerExit {
        irq: field(&caps, KIND, "irq")?,
        handled: text(&caps, "ret") == "handled",
    }))
}

fn decode_softirq(kind: &'static str, payload: &str) -> Result<Softirq, DecodeError> {
    let caps = captures(&SOFTIRQ_RE, kind, payload)?;
    Ok(Softirq {
        vec: field(&caps, kind, "vec")?,
        action: text(&caps, "action"),
    })
}

pub fn decode_softirq_entry(payload: &str) -> Result<Payload, DecodeError> {
    decode_softirq("softirq_entry", payload).map(Payload::SoftirqEntry)
}

pub fn decode_softirq_exit(payload: &str) -> Result<Payload, DecodeError> {
    decode_softirq("softirq_exit", payload).map(Payload::SoftirqExit)
}

pub fn decode_workqueue_execute_start(payload: &str) -> Result<Payload, DecodeError> {
    let caps = captures(&WORK_START_RE, "workqueue_execute_start", payload)?;
    Ok(Payload::WorkqueueExecuteStart(WorkqueueStart {
        work: text(&caps, "work"),
        function: text(&caps, "function"),
    }))
}

pub fn decode_workqueue_execute_end(payload: &str) -> Result<Payload, DecodeError> {
    let caps = captures(&WORK_END_RE, "workqueue_execute_end", payload)?;
    Ok(Payload::WorkqueueExecuteEnd(WorkqueueEnd {
        work: text(&caps, "work"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_irq_pair() {
        assert_eq!(
            decode_irq_handler_entry("irq=13 name=fts_touch").unwrap(),
            Payload::IrqHandlerEntry(IrqHandlerEntry {
                irq: 13,
                name: "fts_touch".to_string()
            })
        );
        assert_eq!(
            decode_irq_handler_exit("irq=13 ret=handled").unwrap(),
            Payload::IrqHandlerExit(IrqHandlerExit {
                irq: 13,
                handled: true
            })
        );
    }

    #[test]
    fn test_decode_softirq() {
        assert_eq!(
            decode_softirq_entry("vec=1 [action=TIMER]").unwrap(),
            Payload::SoftirqEntry(Softirq {
                vec: 1,
                action: "TIMER".to_string()
            })
        );
    }

    #[test]
    fn test_decode_workqueue() {
        assert_eq!(
            decode_workqueue_execute_start("work struct ffffffc0b7a3c0a8: function vmstat_update")
                .unwrap(),
            Payload::WorkqueueExecuteStart(WorkqueueStart {
                work: "ffffffc0b7a3c0a8".to_string(),
                function: "vmstat_update".to_string()
            })
        );
        assert_eq!(
            decode_workqueue_execute_end("work struct ffffffc0b7a3c0a8").unwrap(),
            Payload::WorkqueueExecuteEnd(WorkqueueEnd {
                work: "ffffffc0b7a3c0a8".to_string()
            })
        );
    }
}
