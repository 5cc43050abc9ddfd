//! Outcomes of a backup run and of a configuration check.

use std::path::{Path, PathBuf};

use backhaul_config::{ConfigError, JobConfig};
use backhaul_fsops::PurgeReport;
use serde::Serialize;

use crate::error::{AppError, error_chain};

/// Phase of a job in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Reading and validating the job's properties file.
    Load,
    /// Retrieving staged files.
    Fetch,
    /// Purging expired archive copies.
    Purge,
}

impl JobStage {
    /// Stable label for logs and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Fetch => "fetch",
            Self::Purge => "purge",
        }
    }
}

/// First failure recorded for a job.
#[derive(Debug)]
pub struct JobFailure {
    /// Phase that failed.
    pub stage: JobStage,
    /// Underlying error.
    pub error: AppError,
}

/// Outcome of one job.
#[derive(Debug)]
pub struct JobReport {
    /// Properties file the job came from.
    pub source: PathBuf,
    /// Local paths of copies retrieved, in instruction order.
    pub fetched: Vec<PathBuf>,
    /// First failure, if any.
    pub failure: Option<JobFailure>,
    /// Purge outcome when the purge pass ran to completion.
    pub purge: Option<PurgeReport>,
}

impl JobReport {
    pub(crate) fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            fetched: Vec::new(),
            failure: None,
            purge: None,
        }
    }

    /// Keep the first failure; later ones are only logged by the caller.
    pub(crate) fn record_failure(&mut self, stage: JobStage, error: AppError) {
        if self.failure.is_none() {
            self.failure = Some(JobFailure { stage, error });
        }
    }

    /// `true` when nothing failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Outcome of every job in a run, in source order.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Per-job reports.
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    /// `true` when every job succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.jobs.iter().all(JobReport::is_success)
    }

    /// Number of failed jobs.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.jobs.iter().filter(|job| !job.is_success()).count()
    }
}

/// Validation result for one properties file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobCheck {
    /// Properties file checked.
    pub source: PathBuf,
    /// Parsed job when the file is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobConfig>,
    /// Rendered error chain when the file is invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobCheck {
    pub(crate) fn from_load(source: &Path, loaded: Result<JobConfig, ConfigError>) -> Self {
        match loaded {
            Ok(job) => Self {
                source: source.to_path_buf(),
                job: Some(job),
                error: None,
            },
            Err(err) => Self {
                source: source.to_path_buf(),
                job: None,
                error: Some(error_chain(&err)),
            },
        }
    }

    /// `true` when the file loaded cleanly.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.job.is_some()
    }
}
