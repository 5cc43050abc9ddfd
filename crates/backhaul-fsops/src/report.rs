//! Outcome of one purge pass.

use std::path::PathBuf;

use serde::Serialize;

/// Counts and paths produced by [`crate::ArchivePurger::purge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// Matching regular files inspected.
    pub examined: usize,
    /// Matching files young enough to keep.
    pub retained: usize,
    /// Files deleted, in scan order.
    pub purged: Vec<PathBuf>,
    /// Per-file problems that did not stop the pass.
    pub warnings: Vec<PurgeWarning>,
}

impl PurgeReport {
    /// `true` when the pass hit no per-file problems.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// A file the purge pass could not inspect or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeWarning {
    /// Path involved.
    pub path: PathBuf,
    /// Step that failed (`traverse`, `stat`, `remove`).
    pub operation: &'static str,
    /// Rendered underlying error.
    pub reason: String,
}
