//! Record-kind to decoder table.
//!
//! The table is plain data built once and handed to the tokenizer, so
//! several sessions (or a test with fake decoders) can coexist.

use super::{atrace, bus, irq, power, sched, Payload};
use crate::utils::error::{DecodeError, RegistryError};
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;

/// Decoder for one record kind's free-text payload
pub type DecodeFn = fn(&str) -> Result<Payload, DecodeError>;

/// Built-in decoders, registered by `DecoderRegistry::standard`
const STANDARD_DECODERS: &[(&str, DecodeFn)] = &[
    ("sched_switch", sched::decode_sched_switch),
    ("sched_wakeup", sched::decode_sched_wakeup),
    ("sched_migrate_task", sched::decode_sched_migrate_task),
    ("cpu_frequency", power::decode_cpu_frequency),
    ("cpu_idle", power::decode_cpu_idle),
    ("clock_set_rate", power::decode_clock_set_rate),
    ("clock_enable", power::decode_clock_enable),
    ("clock_disable", power::decode_clock_disable),
    ("tracing_mark_write", atrace::decode_tracing_mark_write),
    ("bus_update_request", bus::decode_bus_update_request),
    ("irq_handler_entry", irq::decode_irq_handler_entry),
    ("irq_handler_exit", irq::decode_irq_handler_exit),
    ("softirq_entry", irq::decode_softirq_entry),
    ("softirq_exit", irq::decode_softirq_exit),
    ("workqueue_execute_start", irq::decode_workqueue_execute_start),
    ("workqueue_execute_end", irq::decode_workqueue_execute_end),
];

/// Maps record-kind names to payload decoders
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl DecoderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in decoder
    ///
    /// **Public** - default table used by `TraceSession::open`
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (kind, decode) in STANDARD_DECODERS {
            registry.register(*kind, *decode)?;
        }
        Ok(registry)
    }

    /// Register a decoder under a record-kind name
    ///
    /// **Public** - load-time only
    ///
    /// # Errors
    /// * `RegistryError::DuplicateDecoder` - `kind` already has a decoder
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        decode: DecodeFn,
    ) -> Result<(), RegistryError> {
        let kind = kind.into();
        if self.decoders.contains_key(&kind) {
            return Err(RegistryError::DuplicateDecoder(kind));
        }
        debug!("Registering decoder for {}", kind);
        self.decoders.insert(kind, decode);
        Ok(())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.decoders.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Decode a payload, falling back to the raw text
    ///
    /// **Public** - called by the tokenizer for every kept line
    ///
    /// Never fails: a decode error is logged as a warning and the original
    /// text is returned as `Payload::Raw`. Kinds without a decoder are raw
    /// without a warning, since most traces carry many of them.
    pub fn decode(&self, kind: &str, payload: &str) -> Payload {
        let Some(decode) = self.decoders.get(kind) else {
            return Payload::Raw(payload.to_string());
        };

        match decode(payload) {
            Ok(decoded) => decoded,
            Err(DecodeError::Skipped(what)) => {
                debug!("Skipping {} record: {}", kind, what);
                Payload::Raw(payload.to_string())
            }
            Err(e) => {
                warn!("Error parsing {} with {}: {}", kind, payload, e);
                Payload::Raw(payload.to_string())
            }
        }
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.decoders.keys().collect();
        kinds.sort();
        f.debug_struct("DecoderRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_fails(payload: &str) -> Result<Payload, DecodeError> {
        Err(DecodeError::NoMatch {
            kind: "broken",
            payload: payload.to_string(),
        })
    }

    fn echo(payload: &str) -> Result<Payload, DecodeError> {
        Ok(Payload::Raw(payload.to_uppercase()))
    }

    #[test]
    fn test_standard_registry_has_no_duplicates() {
        let registry = DecoderRegistry::standard().unwrap();
        assert_eq!(registry.len(), STANDARD_DECODERS.len());
        assert!(registry.contains("sched_switch"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = DecoderRegistry::new();
        registry.register("custom", echo).unwrap();
        let err = registry.register("custom", echo).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateDecoder("custom".to_string()));
    }

    #[test]
    fn test_failed_decode_falls_back_to_raw() {
        let mut registry = DecoderRegistry::new();
        registry.register("broken", always_fails).unwrap();
        assert_eq!(
            registry.decode("broken", "x=1"),
            Payload::Raw("x=1".to_string())
        );
    }

    #[test]
    fn test_unknown_kind_is_raw() {
        let registry = DecoderRegistry::new();
        assert_eq!(
            registry.decode("mystery", "a b c"),
            Payload::Raw("a b c".to_string())
        );
    }

    #[test]
    fn test_registered_decoder_is_used() {
        let mut registry = DecoderRegistry::new();
        registry.register("shout", echo).unwrap();
        assert_eq!(registry.decode("shout", "hi"), Payload::Raw("HI".to_string()));
    }
}
