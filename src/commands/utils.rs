use super::models::TraceSource;
use crate::components::ComponentTable;
use crate::decoders::DecoderRegistry;
use crate::model::Interval;
use crate::reconstruct::IntervalKind;
use crate::session::TraceSession;
use crate::utils::config::{load_config, IngestConfig, SCHEMA_VERSION};
use anyhow::{bail, Context, Result};
use log::debug;

/// Load the ingestion config, apply CLI overrides and parse the trace
///
/// **Public** - shared by the trace-reading commands
pub fn load_session(source: &TraceSource) -> Result<(TraceSession, IngestConfig)> {
    let config = match &source.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => IngestConfig::default(),
    };
    let config = config.with_kinds(source.kinds.clone());
    debug!("Ingestion config: {:?}", config);

    let registry = DecoderRegistry::standard().context("Failed to build decoder registry")?;
    let components = ComponentTable::standard().context("Failed to build component table")?;

    let session = TraceSession::open(&source.file, &registry, components, &config)
        .with_context(|| format!("Failed to parse trace {}", source.file.display()))?;
    Ok((session, config))
}

/// Check that a trace file was given and exists
pub fn validate_source(source: &TraceSource) -> Result<()> {
    if source.file.as_os_str().is_empty() {
        bail!("Trace file cannot be empty");
    }
    if !source.file.is_file() {
        bail!("Trace file not found: {}", source.file.display());
    }
    if let Some(kinds) = &source.kinds {
        if kinds.iter().any(|k| k.trim().is_empty()) {
            bail!("Record kinds cannot be empty");
        }
    }
    Ok(())
}

/// Check a `--start/--end` pair before parsing anything
pub fn validate_window(start: Option<f64>, end: Option<f64>) -> Result<()> {
    for value in [start, end].into_iter().flatten() {
        if !value.is_finite() || value < 0.0 {
            bail!("Range bounds must be non-negative seconds, got {}", value);
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            bail!("Range end {} is before start {}", end, start);
        }
    }
    Ok(())
}

/// Query range from optional bounds; missing bounds default to the trace edges
///
/// Returns `None` when neither bound is given.
pub fn resolve_window(
    session: &TraceSession,
    start: Option<f64>,
    end: Option<f64>,
) -> Result<Option<Interval>> {
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    let start = start.unwrap_or(0.0);
    let end = end.unwrap_or_else(|| session.duration().max(start));
    let window = Interval::new(start, end).context("Invalid query range")?;
    Ok(Some(window))
}

/// List interval kinds and the record kinds they need
pub fn display_kinds() -> Result<()> {
    let table = ComponentTable::standard().context("Failed to build component table")?;

    println!("Interval kinds:");
    for kind in IntervalKind::ALL {
        let owner = table
            .owner(kind)
            .map(|(_, spec)| spec.name)
            .unwrap_or("-");
        println!(
            "  {:<16} [{}] {}",
            kind.as_str(),
            owner,
            kind.requires().join(", ")
        );
    }
    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("ftrace-intervals v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Reconstructs task, clock and section intervals from ftrace text dumps.");
}
