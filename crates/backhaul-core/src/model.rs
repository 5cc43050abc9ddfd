//! Domain models for a backup job.
//!
//! # Design
//! - Instructions are immutable once built from configuration.
//! - Keep these types free of IO so both the retriever and the purger can borrow them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Line remote scripts print to mark the end of meaningful output.
pub const EOF_SENTINEL: &str = "----- EOF -----";

/// Describes one remote file to retrieve and how to prepare it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Remote file name to retrieve from the staging area.
    pub remote_staged_file: String,
    /// Remote command run before the copy step.
    pub prep_script: Option<String>,
    /// Arguments passed to `prep_script`, in order. Ignored without a prep script.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Instruction {
    /// Build an instruction without a preparation step.
    #[must_use]
    pub fn new(remote_staged_file: impl Into<String>) -> Self {
        Self {
            remote_staged_file: remote_staged_file.into(),
            prep_script: None,
            args: Vec::new(),
        }
    }

    /// Attach a preparation script and its ordered arguments.
    #[must_use]
    pub fn with_prep_script<I, S>(mut self, script: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prep_script = Some(script.into());
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments that will actually be sent to the prep script.
    #[must_use]
    pub fn effective_args(&self) -> &[String] {
        if self.prep_script.is_some() {
            &self.args
        } else {
            &[]
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "remote_staged_file={}", self.remote_staged_file)?;
        if let Some(script) = &self.prep_script {
            write!(f, " prep_script={script}")?;
            for arg in &self.args {
                write!(f, " arg={arg}")?;
            }
        }
        Ok(())
    }
}

/// How long archived copies are kept before they are purged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Whole days a local copy may age before it becomes eligible for deletion.
    pub days_till_purge: u32,
}

impl RetentionPolicy {
    /// Build a policy retaining copies for the given number of days.
    #[must_use]
    pub const fn new(days_till_purge: u32) -> Self {
        Self { days_till_purge }
    }

    /// Returns `true` when a copy of the given age must be purged.
    ///
    /// The comparison is strict: a copy exactly `days_till_purge` days old is kept.
    #[must_use]
    pub fn is_expired(&self, age_days: i64) -> bool {
        age_days > i64::from(self.days_till_purge)
    }
}
