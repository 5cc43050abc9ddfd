//! # Design
//!
//! - Centralize application-level errors for bootstrap and orchestration.
//! - Keep error messages constant while carrying an operation label and the source error.
//! - `error_chain` renders the full cause chain for log lines and reports.

use std::error::Error as StdError;
use std::fmt::Write as _;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: backhaul_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: backhaul_telemetry::TelemetryError,
    },
    /// Remote retrieval failed.
    #[error("retrieval operation failed")]
    Retrieval {
        /// Operation identifier.
        operation: &'static str,
        /// Source retrieval error.
        source: backhaul_transfer::RetrievalError,
    },
    /// Archive maintenance failed.
    #[error("archive maintenance failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: backhaul_fsops::FsOpsError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: backhaul_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: backhaul_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn retrieval(
        operation: &'static str,
        source: backhaul_transfer::RetrievalError,
    ) -> Self {
        Self::Retrieval { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: backhaul_fsops::FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    /// Operation label recorded when the error was raised.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Config { operation, .. }
            | Self::Telemetry { operation, .. }
            | Self::Retrieval { operation, .. }
            | Self::FsOps { operation, .. } => operation,
        }
    }
}

/// `error: cause: cause...` for any error with a source chain.
#[must_use]
pub fn error_chain(error: &dyn StdError) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(rendered, ": {cause}");
        source = cause.source();
    }
    rendered
}
