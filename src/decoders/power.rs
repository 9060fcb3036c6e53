//! Power management record kinds: CPU frequency/idle and clock tree changes.

use super::{captures, field, text, Payload};
use crate::utils::config::CPU_IDLE_EXIT_STATE;
use crate::utils::error::DecodeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static CPU_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^state=(?P<state>\d+)\s+cpu_id=(?P<cpu_id>\d+)")
        .expect("Invalid cpu state regex pattern")
});

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<clk>\S+)\s+state=(?P<state>\d+)\s+cpu_id=(?P<cpu_id>\d+)")
        .expect("Invalid clock regex pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuFrequency {
    /// Frequency in kHz
    pub state: u64,
    pub cpu_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuIdle {
    pub state: u32,
    pub cpu_id: u32,
}

impl CpuIdle {
    /// True when the CPU is leaving its low-power state
    pub fn is_exit(&self) -> bool {
        self.state == CPU_IDLE_EXIT_STATE
    }
}

/// Payload shared by `clock_set_rate`, `clock_enable` and `clock_disable`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockEvent {
    pub clk: String,
    /// Rate in Hz for `clock_set_rate`, 0/1 for enable/disable
    pub state: u64,
    pub cpu_id: u32,
}

pub fn decode_cpu_frequency(payload: &str) -> Result<Payload, DecodeError> {
    const KIND: &str = "cpu_frequency";
    let caps = captures(&CPU_STATE_RE, KIND, payload)?;
    Ok(Payload::CpuFrequency(CpuFrequency {
        state: field(&caps, KIND, "state")?,
        cpu_id: field(&caps, KIND, "cpu_id")?,
    }))
}

pub fn decode_cpu_idle(payload: &str) -> Result<Payload, DecodeError> {
    const KIND: &str = "cpu_idle";
    let caps = captures(&CPU_STATE_RE, KIND, payload)?;
    Ok(Payload::CpuIdle(CpuIdle {
        state: field(&caps, KIND, "state")?,
        cpu_id: field(&caps, KIND, "cpu_id")?,
    }))
}

fn decode_clock(kind: &'static str, payload: &str) -> Result<ClockEvent, DecodeError> {
    let caps = captures(&CLOCK_RE, kind, payload)?;
    Ok(ClockEvent {
        clk: text(&caps, "clk"),
        state: field(&caps, kind, "state")?,
        cpu_id: field(&caps, kind, "cpu_id")?,
    })
}

pub fn decode_clock_set_rate(payload: &str) -> Result<Payload, DecodeError> {
    decode_clock("clock_set_rate", payload).map(Payload::ClockSetRate)
}

pub fn decode_clock_enable(payload: &str) -> Result<Payload, DecodeError> {
    decode_clock("clock_enable", payload).map(Payload::ClockEnable)
}

pub fn decode_clock_disable(payload: &str) -> Result<Payload, DecodeError> {
    decode_clock("clock_disable", payload).map(Payload::ClockDisable)
}
