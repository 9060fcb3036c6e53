//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the session, queries and writers to perform user tasks.

pub mod events;
pub mod intervals;
pub mod models;
pub mod summary;
pub mod utils;

// Re-export main command functions
pub use events::execute_events;
pub use intervals::execute_intervals;
pub use models::{EventsArgs, IntervalsArgs, SummaryArgs, TraceSource};
pub use summary::execute_summary;
pub use utils::{display_kinds, display_version};
