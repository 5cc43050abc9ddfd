//! # Design
//!
//! - `ExecutionError` describes one external command; `RetrievalError` says which
//!   step of which staged file it broke.
//! - Every retrieval error carries the staged file name for log context.
//! - Source errors are preserved so callers can render the full chain.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias for command execution.
pub type ExecResult<T> = Result<T, ExecutionError>;

/// Result alias for retrieval operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// Failures of a single external command.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The command could not be started.
    #[error("failed to spawn `{command}`")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying spawn error.
        source: io::Error,
    },
    /// The command wrote to stderr, whatever its exit status.
    #[error("`{command}` wrote to stderr: {stderr}")]
    ErrorOutput {
        /// Rendered command line.
        command: String,
        /// Captured stderr lines joined with spaces.
        stderr: String,
        /// Exit code when the process exited normally.
        exit_code: Option<i32>,
    },
    /// Reading the command's output streams failed.
    #[error("failed to read output of `{command}`")]
    Stream {
        /// Rendered command line.
        command: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The command exceeded the configured timeout and was killed.
    #[error("`{command}` timed out after {}ms", timeout.as_millis())]
    TimedOut {
        /// Rendered command line.
        command: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },
}

/// Failures while retrieving one staged file.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The local backup directory did not exist and could not be created.
    #[error("could not prepare local directory '{}' for {staged_file}", path.display())]
    PrepareLocalDir {
        /// Staged file being retrieved.
        staged_file: String,
        /// Local backup directory.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The remote prep script failed.
    #[error("prep script failed for {staged_file}")]
    Prep {
        /// Staged file being retrieved.
        staged_file: String,
        /// Underlying command failure.
        source: ExecutionError,
    },
    /// Copying the staged file failed.
    #[error("copy failed for {staged_file}")]
    Copy {
        /// Staged file being retrieved.
        staged_file: String,
        /// Underlying command failure.
        source: ExecutionError,
    },
    /// The remote clean script failed after an otherwise successful retrieval.
    #[error("remote cleanup failed for {staged_file}")]
    Clean {
        /// Staged file being retrieved.
        staged_file: String,
        /// Underlying command failure.
        source: ExecutionError,
    },
    /// The staged file name does not yield a deterministic local name.
    #[error("{staged_file} has no dated destination name")]
    UndatedDestination {
        /// Staged file being retrieved.
        staged_file: String,
    },
}

impl RetrievalError {
    /// Staged file the failure relates to.
    #[must_use]
    pub fn staged_file(&self) -> &str {
        match self {
            Self::PrepareLocalDir { staged_file, .. }
            | Self::Prep { staged_file, .. }
            | Self::Copy { staged_file, .. }
            | Self::Clean { staged_file, .. }
            | Self::UndatedDestination { staged_file } => staged_file,
        }
    }
}
