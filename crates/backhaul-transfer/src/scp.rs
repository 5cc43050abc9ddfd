//! Secure-copy retriever.
//!
//! # Design
//! - Remote scripts run through the configured `ssh` command, copies through `scp`.
//! - The clean step is registered before prep starts and runs exactly once, on
//!   release or, failing that, when the guard drops.
//! - A cleanup failure never replaces an earlier failure.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use backhaul_config::{SecureCopySettings, TransportKind};
use backhaul_core::{Clock, Instruction, dated_filename};
use tracing::{error, info, warn};

use crate::command::{CommandLine, CommandRunner};
use crate::error::{RetrievalError, RetrievalResult};
use crate::retriever::FileRetriever;

/// Retrieves staged files with `ssh` and `scp`.
pub struct SecureCopyRetriever {
    settings: SecureCopySettings,
    runner: Arc<dyn CommandRunner>,
    clock: Arc<dyn Clock>,
}

impl SecureCopyRetriever {
    /// Retriever for `settings`, running commands through `runner`.
    #[must_use]
    pub fn new(
        settings: SecureCopySettings,
        runner: Arc<dyn CommandRunner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            runner,
            clock,
        }
    }

    /// Settings this retriever was built from.
    #[must_use]
    pub const fn settings(&self) -> &SecureCopySettings {
        &self.settings
    }

    /// `target:[staging_dir/]staged_file`.
    fn remote_source(&self, staged_file: &str) -> String {
        let target = self.settings.connection_target();
        match self.settings.remote_staging_dir.as_deref() {
            Some(dir) if dir.ends_with('/') => format!("{target}:{dir}{staged_file}"),
            Some(dir) => format!("{target}:{dir}/{staged_file}"),
            None => format!("{target}:{staged_file}"),
        }
    }

    fn remote_command(&self, script: &str) -> CommandLine {
        CommandLine::new(&self.settings.ssh_command)
            .arg(self.settings.connection_target())
            .arg(script)
    }

    fn prepare_local_dir(&self, staged_file: &str) -> RetrievalResult<()> {
        let path = &self.settings.local_backup_dir;
        fs::create_dir_all(path).map_err(|source| RetrievalError::PrepareLocalDir {
            staged_file: staged_file.to_string(),
            path: path.clone(),
            source,
        })
    }

    fn prep(&self, instruction: &Instruction) -> RetrievalResult<()> {
        let Some(script) = instruction.prep_script.as_deref() else {
            return Ok(());
        };
        let command = self
            .remote_command(script)
            .args(instruction.effective_args().iter().cloned());
        self.runner
            .run(&command)
            .map(drop)
            .map_err(|source| RetrievalError::Prep {
                staged_file: instruction.remote_staged_file.clone(),
                source,
            })
    }

    fn copy(&self, staged_file: &str, destination: &Path) -> RetrievalResult<()> {
        let command = CommandLine::new(&self.settings.scp_command)
            .arg(self.remote_source(staged_file))
            .arg(destination.to_string_lossy());
        self.runner
            .run(&command)
            .map(drop)
            .map_err(|source| RetrievalError::Copy {
                staged_file: staged_file.to_string(),
                source,
            })
    }
}

impl FileRetriever for SecureCopyRetriever {
    fn transport(&self) -> TransportKind {
        TransportKind::SecureCopy
    }

    fn local_backup_dir(&self) -> &Path {
        &self.settings.local_backup_dir
    }

    fn fetch_one(&self, instruction: &Instruction) -> RetrievalResult<PathBuf> {
        let staged_file = instruction.remote_staged_file.as_str();
        info!(instruction = %instruction, "retrieving staged file");

        let dated = dated_filename(staged_file, self.clock.now().date_naive());
        if dated.is_empty() {
            return Err(RetrievalError::UndatedDestination {
                staged_file: staged_file.to_string(),
            });
        }
        self.prepare_local_dir(staged_file)?;
        let destination = self.settings.local_backup_dir.join(dated);

        let cleanup = CleanupGuard::register(
            self.settings
                .clean_script
                .as_deref()
                .map(|script| self.remote_command(script).arg(staged_file)),
            self.runner.as_ref(),
            staged_file,
        );
        let outcome = self
            .prep(instruction)
            .and_then(|()| self.copy(staged_file, &destination))
            .map(|()| destination);
        let outcome = cleanup.release(outcome);

        if let Ok(path) = &outcome {
            info!(staged_file, destination = %path.display(), "retrieved staged file");
        }
        outcome
    }
}

/// Runs the remote clean step exactly once.
struct CleanupGuard<'a> {
    command: Option<CommandLine>,
    runner: &'a dyn CommandRunner,
    staged_file: &'a str,
}

impl<'a> CleanupGuard<'a> {
    const fn register(
        command: Option<CommandLine>,
        runner: &'a dyn CommandRunner,
        staged_file: &'a str,
    ) -> Self {
        Self {
            command,
            runner,
            staged_file,
        }
    }

    /// Run the clean step and merge its result into `outcome`.
    fn release<T>(mut self, outcome: RetrievalResult<T>) -> RetrievalResult<T> {
        let Some(command) = self.command.take() else {
            return outcome;
        };
        let cleaned = self
            .runner
            .run(&command)
            .map_err(|source| RetrievalError::Clean {
                staged_file: self.staged_file.to_string(),
                source,
            });
        match (outcome, cleaned) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(clean)) => Err(clean),
            (Err(earlier), Ok(_)) => Err(earlier),
            (Err(earlier), Err(clean)) => {
                warn!(
                    staged_file = self.staged_file,
                    error = %clean,
                    "remote cleanup failed after an earlier failure"
                );
                Err(earlier)
            }
        }
    }
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        if let Some(command) = self.command.take()
            && let Err(err) = self.runner.run(&command)
        {
            error!(staged_file = self.staged_file, error = %err, "remote cleanup failed");
        }
    }
}
