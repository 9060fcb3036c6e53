//! Configuration and constants for ingestion and the CLI.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Marker that identifies the column-header line; records start after it
pub const COLUMN_HEADER_MARKER: &str = "TASK-PID";

/// Marker for the tracer-name header line
pub const TRACER_MARKER: &str = "tracer:";

/// Marker for the buffer occupancy header line
pub const BUFFER_MARKER: &str = "entries-in-buffer";

/// `cpu_idle` state reported when a CPU leaves its low-power state
pub const CPU_IDLE_EXIT_STATE: u32 = 4_294_967_295;

/// Record kind whose payload carries its own absolute timestamp
pub const BUS_UPDATE_REQUEST: &str = "bus_update_request";

/// Emit a progress log line every this many kept events
pub const PROGRESS_LOG_INTERVAL: usize = 100_000;

/// Ingestion settings, usually loaded from a TOML file
///
/// ```toml
/// kinds = ["sched_switch", "tracing_mark_write"]
/// parallel = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Record kinds to keep; `None` keeps everything
    #[serde(default)]
    pub kinds: Option<Vec<String>>,

    /// Run reconstruction components on scoped threads
    #[serde(default)]
    pub parallel: bool,
}

impl IngestConfig {
    /// Merge CLI overrides on top of file settings
    ///
    /// **Public** - used by commands
    pub fn with_kinds(mut self, kinds: Option<Vec<String>>) -> Self {
        if kinds.is_some() {
            self.kinds = kinds;
        }
        self
    }
}

/// Load ingestion settings from a TOML file
///
/// **Public** - used by commands when `--config` is supplied
///
/// # Errors
/// * `ConfigError::Io` - If file cannot be read
/// * `ConfigError::Parse` - If TOML is invalid
pub fn load_config(path: impl AsRef<Path>) -> Result<IngestConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: IngestConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config: IngestConfig =
            toml::from_str("kinds = [\"sched_switch\"]\nparallel = true\n").unwrap();
        assert_eq!(config.kinds, Some(vec!["sched_switch".to_string()]));
        assert!(config.parallel);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: IngestConfig = toml::from_str("").unwrap();
        assert_eq!(config, IngestConfig::default());
    }

    #[test]
    fn test_cli_kinds_override() {
        let config = IngestConfig {
            kinds: Some(vec!["a".to_string()]),
            parallel: false,
        };
        assert_eq!(
            config.clone().with_kinds(None).kinds,
            Some(vec!["a".to_string()])
        );
        assert_eq!(
            config.with_kinds(Some(vec!["b".to_string()])).kinds,
            Some(vec!["b".to_string()])
        );
    }
}
