//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! Per-line problems (decode failures, unmatched markers) never show up here:
//! they are logged and absorbed where they happen. Only structural failures
//! propagate.

use thiserror::Error;

/// An interval whose end precedes its start
///
/// Indicates corrupted timestamps upstream, so it is never recovered locally.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("End timestamp {end} cannot be less than start timestamp {start}")]
pub struct IntervalError {
    pub start: f64,
    pub end: f64,
}

/// Errors raised by a payload decoder
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Payload does not match {kind} grammar: {payload}")]
    NoMatch { kind: &'static str, payload: String },

    #[error("Invalid {field} in {kind} payload: {value}")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Skipping {0}")]
    Skipped(String),
}

/// Errors raised while building decoder or component tables
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Decoder already registered for record kind: {0}")]
    DuplicateDecoder(String),

    #[error("Interval kind {kind} already produced by component {owner}")]
    DuplicateProducer { kind: String, owner: String },
}

/// File-level failures during ingestion
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No column header (TASK-PID) found in trace")]
    MissingHeader,

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Interval invariant violated: {0}")]
    Interval(#[from] IntervalError),
}

/// Errors returned from the query API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("{kind} intervals need record kinds not present in trace: {missing:?}")]
    Unsupported { kind: String, missing: Vec<String> },

    #[error("No component produces interval kind: {0}")]
    UnknownKind(String),

    #[error("Reconstruction failed: {0}")]
    Reconstruction(#[from] IntervalError),

    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),
}

/// Errors raised by the sorted merge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("Unsupported merge input at position {index}: {reason}")]
    MissingOrderingKey { index: usize, reason: String },

    #[error("Merge input {index} is not sorted at element {position}")]
    Unsorted { index: usize, position: usize },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while loading an ingestion config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
