//! Logging setup for the `clinrec` binary.
//!
//! Library crates only emit `tracing` events; this module installs the global
//! subscriber.
//!
//! # Log Levels
//!
//! - `error`: fatal command failures
//! - `warn`: skipped rows, failed records, translation lookup failures
//! - `info`: batch progress and summary counts
//! - `debug`: per-record outcomes and ignored extra entries
//! - `trace`: attribute values (only with `--log-data`)

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::{self, format::FmtSpan, writer::BoxMakeWriter};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_DATA_ENABLED: AtomicBool = AtomicBool::new(false);

/// Placeholder logged in place of clinical values unless `--log-data` is set.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// `value` when data logging is enabled, otherwise [`REDACTED_VALUE`].
pub fn redact_value(value: &str) -> &str {
    if LOG_DATA_ENABLED.load(Ordering::Relaxed) {
        value
    } else {
        REDACTED_VALUE
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level_filter: LevelFilter,
    /// Let `RUST_LOG` override `level_filter` when it is set.
    pub use_env_filter: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Append to this file instead of writing to stderr.
    pub log_file: Option<PathBuf>,
    pub log_data: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::WARN,
            use_env_filter: true,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
            log_data: false,
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    LOG_DATA_ENABLED.store(config.log_data, Ordering::Relaxed);
    let writer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    let layer = fmt::layer().with_writer(writer).with_target(false);
    let registry = tracing_subscriber::registry().with(build_env_filter(config));
    match config.format {
        LogFormat::Json => registry
            .with(layer.json().with_span_events(FmtSpan::CLOSE))
            .init(),
        LogFormat::Compact => registry
            .with(layer.compact().with_ansi(config.with_ansi).without_time())
            .init(),
        LogFormat::Pretty => registry
            .with(layer.with_ansi(config.with_ansi).without_time())
            .init(),
    }
    Ok(())
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let fallback = || {
        // Dependencies stay at warn.
        EnvFilter::new(format!(
            "warn,clinrec={level},clinrec_cli={level},clinrec_filter={level},\
             clinrec_hydrate={level},clinrec_index={level},clinrec_model={level},\
             clinrec_terminology={level}",
            level = config.level_filter.to_string().to_lowercase()
        ))
    };
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        fallback()
    }
}
