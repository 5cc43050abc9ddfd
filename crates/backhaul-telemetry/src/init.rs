//! Logging initialisation and configuration.
//!
//! # Design
//! - Single entry point installing a `tracing-subscriber` registry.
//! - `RUST_LOG` overrides the configured level when present.
//! - Output goes to stdout, stderr, or an append-mode log file, pretty or JSON.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Default logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging configuration.
#[derive(Debug, Clone, Copy)]
pub struct LoggingConfig<'a> {
    /// Log level string (e.g., `info`, `debug`).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Where log lines are written.
    pub destination: LogDestination<'a>,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            destination: LogDestination::Stdout,
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable log lines.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination<'a> {
    /// Standard output.
    Stdout,
    /// Standard error, for commands that print results on stdout.
    Stderr,
    /// Append to the file at this path, creating it when missing.
    File(&'a Path),
}

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or the subscriber cannot
/// be installed (for example, because another subscriber is already set).
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let (writer, ansi) = build_writer(config.destination)?;
    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_thread_ids(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(build_env_filter(config.level))
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })
}

fn build_writer(destination: LogDestination<'_>) -> Result<(BoxMakeWriter, bool)> {
    match destination {
        LogDestination::Stdout => Ok((BoxMakeWriter::new(io::stdout), true)),
        LogDestination::Stderr => Ok((BoxMakeWriter::new(io::stderr), true)),
        LogDestination::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| TelemetryError::OpenLogFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            Ok((BoxMakeWriter::new(Mutex::new(file)), false))
        }
    }
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
