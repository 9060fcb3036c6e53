//! `tracing_mark_write` payloads written by Android's atrace.
//!
//! Userspace writes `<phase>|<pid>|<name>[|<cookie or value>]` into the trace
//! marker. The phases we understand:
//!
//! | Phase | Meaning                        |
//! |-------|--------------------------------|
//! | `B`   | begin a nested section         |
//! | `E`   | end the innermost section      |
//! | `S`   | begin an async section (cookie)|
//! | `F`   | finish an async section        |
//! | `C`   | counter value change           |

use super::Payload;
use crate::utils::error::DecodeError;
use serde::{Deserialize, Serialize};

const KIND: &str = "tracing_mark_write";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum AtraceMark {
    Begin { pid: u32, name: String },
    /// The pid is optional; section nesting is per writing thread
    End { pid: Option<u32> },
    AsyncBegin { pid: u32, name: String, cookie: i64 },
    AsyncEnd { pid: u32, name: String, cookie: i64 },
    Counter { pid: u32, name: String, value: i64 },
}

impl AtraceMark {
    /// Section or counter name, if the mark carries one
    pub fn name(&self) -> Option<&str> {
        match self {
            AtraceMark::Begin { name, .. }
            | AtraceMark::AsyncBegin { name, .. }
            | AtraceMark::AsyncEnd { name, .. }
            | AtraceMark::Counter { name, .. } => Some(name),
            AtraceMark::End { .. } => None,
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    value: Option<&str>,
) -> Result<T, DecodeError> {
    let value = value.unwrap_or_default().trim();
    value.parse::<T>().map_err(|_| DecodeError::InvalidField {
        kind: KIND,
        field,
        value: value.to_string(),
    })
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, DecodeError> {
    value.ok_or(DecodeError::InvalidField {
        kind: KIND,
        field,
        value: String::new(),
    })
}

pub fn decode_tracing_mark_write(payload: &str) -> Result<Payload, DecodeError> {
    let trimmed = payload.trim();
    if trimmed.starts_with("trace_event_clock_sync") {
        return Err(DecodeError::Skipped("trace_event_clock_sync".to_string()));
    }

    let mut chunks = trimmed.split('|');
    let phase = chunks.next().unwrap_or_default();

    let mark = match phase {
        "B" => {
            let pid = parse_number("pid", chunks.next())?;
            // Section names may legally contain '|'
            let name = chunks.collect::<Vec<_>>().join("|");
            AtraceMark::Begin { pid, name }
        }
        "E" => {
            let pid = chunks
                .next()
                .filter(|p| !p.trim().is_empty())
                .map(|p| parse_number("pid", Some(p)))
                .transpose()?;
            AtraceMark::End { pid }
        }
        "S" | "F" => {
            let pid = parse_number("pid", chunks.next())?;
            let name = required("name", chunks.next())?.to_string();
            let cookie = parse_number("cookie", chunks.next())?;
            if phase == "S" {
                AtraceMark::AsyncBegin { pid, name, cookie }
            } else {
                AtraceMark::AsyncEnd { pid, name, cookie }
            }
        }
        "C" => {
            let pid = parse_number("pid", chunks.next())?;
            let name = required("name", chunks.next())?.to_string();
            let value = parse_number("value", chunks.next())?;
            AtraceMark::Counter { pid, name, value }
        }
        _ => {
            return Err(DecodeError::NoMatch {
                kind: KIND,
                payload: payload.to_string(),
            })
        }
    };

    Ok(Payload::TracingMarkWrite(mark))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(payload: &str) -> AtraceMark {
        match decode_tracing_mark_write(payload).unwrap() {
            Payload::TracingMarkWrite(mark) => mark,
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_begin_and_end() {
        assert_eq!(
            mark("B|1234|Choreographer#doFrame"),
            AtraceMark::Begin {
                pid: 1234,
                name: "Choreographer#doFrame".to_string()
            }
        );
        assert_eq!(mark("E"), AtraceMark::End { pid: None });
        assert_eq!(mark("E|1234"), AtraceMark::End { pid: Some(1234) });
    }

    #[test]
    fn test_begin_name_with_pipe() {
        assert_eq!(
            mark("B|7|inflate|layout"),
            AtraceMark::Begin {
                pid: 7,
                name: "inflate|layout".to_string()
            }
        );
    }

    #[test]
    fn test_async_and_counter() {
        assert_eq!(
            mark("S|900|launching: com.example|42"),
            AtraceMark::AsyncBegin {
                pid: 900,
                name: "launching: com.example".to_string(),
                cookie: 42
            }
        );
        assert_eq!(
            mark("C|311|VSYNC-sf|1"),
            AtraceMark::Counter {
                pid: 311,
                name: "VSYNC-sf".to_string(),
                value: 1
            }
        );
    }

    #[test]
    fn test_clock_sync_is_skipped() {
        assert!(matches!(
            decode_tracing_mark_write("trace_event_clock_sync: parent_ts=23.5"),
            Err(DecodeError::Skipped(_))
        ));
    }

    #[test]
    fn test_unknown_phase_fails() {
        assert!(decode_tracing_mark_write("Q|1|what").is_err());
        assert!(decode_tracing_mark_write("C|1|counter|notanumber").is_err());
    }
}
