//! ftrace-intervals
//!
//! Reconstructs time intervals (task runs, clock and frequency levels,
//! atrace sections, irq handlers, bus votes) from Linux ftrace and
//! systrace text dumps.
//!
//! ## Getting Started
//!
//! ```ignore
//! use ftrace_intervals::components::ComponentTable;
//! use ftrace_intervals::decoders::DecoderRegistry;
//! use ftrace_intervals::reconstruct::IntervalKind;
//! use ftrace_intervals::session::TraceSession;
//! use ftrace_intervals::utils::config::IngestConfig;
//!
//! let registry = DecoderRegistry::standard()?;
//! let session = TraceSession::open(
//!     "trace.txt",
//!     &registry,
//!     ComponentTable::standard()?,
//!     &IngestConfig::default(),
//! )?;
//! let runs = session.intervals(IntervalKind::TaskRun, Some("0"), None, true)?;
//! ```
//!
//! The `ftrace-intervals` binary wraps the same API:
//!
//! ```bash
//! ftrace-intervals summary --file trace.txt
//! ftrace-intervals intervals --file trace.txt --kind section --merged
//! ```

pub mod commands;
pub mod components;
pub mod containers;
pub mod decoders;
pub mod model;
pub mod output;
pub mod parser;
pub mod reconstruct;
pub mod session;
pub mod utils;
