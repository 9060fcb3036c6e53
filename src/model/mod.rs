//! Core value types shared by the parser, containers and reconstruction.
//!
//! - `Interval`: closed time range with `end >= start`
//! - `Task`: thread identity, compared by pid
//! - `Event`: one decoded trace record

pub mod event;
pub mod interval;
pub mod task;

// Re-export main types
pub use event::{Event, EventFlags, IrqContext};
pub use interval::Interval;
pub use task::{Task, TaskState};
