//! Error types for telemetry operations.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug)]
pub enum TelemetryError {
    /// Opening the log file failed.
    OpenLogFile {
        /// Log file path that could not be opened.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Installing the tracing subscriber failed.
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenLogFile { path, .. } => {
                write!(formatter, "failed to open log file '{}'", path.display())
            }
            Self::SubscriberInstall { .. } => {
                formatter.write_str("failed to install tracing subscriber")
            }
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::OpenLogFile { source, .. } => Some(source),
            Self::SubscriberInstall { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_log_file_error_carries_path_and_source() {
        let err = TelemetryError::OpenLogFile {
            path: PathBuf::from("/var/log/backhaul.log"),
            source: std::io::Error::other("denied"),
        };
        assert_eq!(
            err.to_string(),
            "failed to open log file '/var/log/backhaul.log'"
        );
        assert!(err.source().is_some());
    }
}
