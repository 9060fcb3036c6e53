//! Trace text parsing.
//!
//! This module handles:
//! - Reading header metadata (tracer, buffer occupancy)
//! - Locating the column header
//! - Tokenizing record lines into decoded, normalized events

pub mod header;
pub mod tokenizer;

// Re-export main types
pub use header::TraceHeader;
pub use tokenizer::{parse_line, ParseStats, RawLine, Tokenizer};
