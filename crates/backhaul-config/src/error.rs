//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a configuration source failed.
    #[error("failed to {operation} '{}'", path.display())]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path of the configuration source.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A line in a properties file could not be parsed.
    #[error("malformed line {line} in '{}'", path.display())]
    InvalidLine {
        /// Path of the properties file.
        path: PathBuf,
        /// One-based line number where the logical line starts.
        line: usize,
        /// Raw logical line content.
        content: String,
    },
    /// A required field was absent.
    #[error("missing required field '{field}' in '{section}'")]
    MissingField {
        /// Section that should contain the field.
        section: String,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A field contained an invalid value.
    #[error("invalid value for '{field}' in '{section}': {reason}")]
    InvalidField {
        /// Section that failed validation.
        section: String,
        /// Field that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The retriever transport name did not match a known implementation.
    #[error("unknown retriever transport '{value}'")]
    UnknownTransport {
        /// Transport identifier supplied by the configuration.
        value: String,
    },
    /// Neither a properties file nor a backup list was supplied.
    #[error("no configuration sources supplied")]
    NoSources,
}

impl ConfigError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(
        section: &str,
        field: impl Into<String>,
        value: Option<&str>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section: section.to_string(),
            field: field.into(),
            value: value.map(str::to_string),
            reason,
        }
    }

    pub(crate) fn missing(section: &str, field: &'static str) -> Self {
        Self::MissingField {
            section: section.to_string(),
            field,
        }
    }
}
