//! Transport-neutral retrieval interface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use backhaul_config::{RetrieverSettings, TransportKind};
use backhaul_core::{Clock, Instruction};

use crate::command::CommandRunner;
use crate::error::RetrievalResult;
use crate::scp::SecureCopyRetriever;

/// Moves staged remote files into the local backup directory.
pub trait FileRetriever {
    /// Transport this retriever speaks.
    fn transport(&self) -> TransportKind;

    /// Directory receiving the dated copies.
    fn local_backup_dir(&self) -> &Path;

    /// Prepare, copy, and clean up one staged file, returning the local copy's path.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::RetrievalError`] naming the step that failed.
    fn fetch_one(&self, instruction: &Instruction) -> RetrievalResult<PathBuf>;
}

/// Build the retriever matching `settings`.
#[must_use]
pub fn build_retriever(
    settings: &RetrieverSettings,
    runner: Arc<dyn CommandRunner>,
    clock: Arc<dyn Clock>,
) -> Box<dyn FileRetriever> {
    match settings {
        RetrieverSettings::SecureCopy(settings) => Box::new(SecureCopyRetriever::new(
            settings.clone(),
            runner,
            clock,
        )),
    }
}
