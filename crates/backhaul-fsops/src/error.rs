//! # Design
//!
//! - Constant-message errors; context lives in fields.
//! - Only pattern compilation can fail a purge pass. Per-file problems are
//!   warnings on the report.

use thiserror::Error;

/// Result type for archive maintenance.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by archive maintenance.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// Globset compilation failures.
    #[error("fsops glob failure")]
    Glob {
        /// Operation that triggered the glob failure.
        operation: &'static str,
        /// Glob pattern that failed to compile.
        pattern: String,
        /// Underlying globset error.
        source: globset::Error,
    },
}

impl FsOpsError {
    pub(crate) const fn glob(operation: &'static str, pattern: String, source: globset::Error) -> Self {
        Self::Glob {
            operation,
            pattern,
            source,
        }
    }
}
