//! `bus_update_request` (MSM bus scaling votes).
//!
//! This subsystem stamps each record with its own clock, so `timestamp` here
//! is absolute; the tokenizer rebases it and moves the record to that time.

use super::{captures, field, text, Payload};
use crate::utils::error::DecodeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static BUS_UPDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^time[=:](?P<timestamp>\S+)\s+name[=:](?P<name>\S+)\s+src[=:](?P<src>\d+)\s+dest[=:](?P<dest>\d+)\s+ab[=:](?P<ab>\d+)\s+ib[=:](?P<ib>\d+)\s+active[=:](?P<active>\d+)",
    )
    .expect("Invalid bus_update_request regex pattern")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusUpdateRequest {
    /// Seconds; absolute when decoded, rebased by the tokenizer
    pub timestamp: f64,
    pub name: String,
    pub src: u32,
    pub dest: u32,
    /// Average bandwidth vote, bytes/s
    pub ab: u64,
    /// Instantaneous bandwidth vote, bytes/s
    pub ib: u64,
    pub active: bool,
}

pub fn decode_bus_update_request(payload: &str) -> Result<Payload, DecodeError> {
    const KIND: &str = "bus_update_request";
    let caps = captures(&BUS_UPDATE_RE, KIND, payload)?;
    let active: u32 = field(&caps, KIND, "active")?;

    // f64 parsing accepts `nan` and `inf`, which would poison the timeline
    let timestamp: f64 = field(&caps, KIND, "timestamp")?;
    if !timestamp.is_finite() {
        return Err(DecodeError::InvalidField {
            kind: KIND,
            field: "timestamp",
            value: text(&caps, "timestamp"),
        });
    }

    Ok(Payload::BusUpdateRequest(BusUpdateRequest {
        timestamp,
        name: text(&caps, "name"),
        src: field(&caps, KIND, "src")?,
        dest: field(&caps, KIND, "dest")?,
        ab: field(&caps, KIND, "ab")?,
        ib: field(&caps, KIND, "ib")?,
        active: active != 0,
    }))
}
