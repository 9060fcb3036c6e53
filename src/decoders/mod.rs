//! Payload decoders for individual record kinds.
//!
//! Each decoder turns the free text after `<record-kind>: ` into a typed
//! payload. Decoders are independent and registered by name in a
//! `DecoderRegistry`; anything without a decoder stays raw text.

pub mod atrace;
pub mod bus;
pub mod irq;
pub mod power;
pub mod registry;
pub mod sched;

use crate::utils::error::DecodeError;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Re-export main types
pub use atrace::AtraceMark;
pub use bus::BusUpdateRequest;
pub use irq::{IrqHandlerEntry, IrqHandlerExit, Softirq, WorkqueueEnd, WorkqueueStart};
pub use power::{ClockEvent, CpuFrequency, CpuIdle};
pub use registry::{DecodeFn, DecoderRegistry};
pub use sched::{SchedMigrateTask, SchedSwitch, SchedWakeup};

/// Decoded payload of one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    SchedSwitch(SchedSwitch),
    SchedWakeup(SchedWakeup),
    SchedMigrateTask(SchedMigrateTask),
    CpuFrequency(CpuFrequency),
    CpuIdle(CpuIdle),
    ClockSetRate(ClockEvent),
    ClockEnable(ClockEvent),
    ClockDisable(ClockEvent),
    TracingMarkWrite(AtraceMark),
    BusUpdateRequest(BusUpdateRequest),
    IrqHandlerEntry(IrqHandlerEntry),
    IrqHandlerExit(IrqHandlerExit),
    SoftirqEntry(Softirq),
    SoftirqExit(Softirq),
    WorkqueueExecuteStart(WorkqueueStart),
    WorkqueueExecuteEnd(WorkqueueEnd),
    /// No decoder, or decoding failed
    Raw(String),
}

impl Payload {
    pub fn is_raw(&self) -> bool {
        matches!(self, Payload::Raw(_))
    }
}

/// Match `payload` against a decoder grammar
///
/// **Private** - shared by the regex-based decoders
pub(crate) fn captures<'a>(
    pattern: &Regex,
    kind: &'static str,
    payload: &'a str,
) -> Result<Captures<'a>, DecodeError> {
    pattern.captures(payload).ok_or_else(|| DecodeError::NoMatch {
        kind,
        payload: payload.to_string(),
    })
}

/// Parse one named capture group
///
/// **Private** - shared by the regex-based decoders
pub(crate) fn field<T: FromStr>(
    caps: &Captures<'_>,
    kind: &'static str,
    name: &'static str,
) -> Result<T, DecodeError> {
    let value = caps.name(name).map(|m| m.as_str()).unwrap_or_default();
    value.trim().parse::<T>().map_err(|_| DecodeError::InvalidField {
        kind,
        field: name,
        value: value.to_string(),
    })
}

/// Text of one named capture group, trimmed
pub(crate) fn text(caps: &Captures<'_>, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
