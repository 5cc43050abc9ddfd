//! Sequential backup orchestration.
//!
//! # Design
//! - Jobs run one after another and share nothing but the command runner and clock.
//! - Inside a job every instruction is fetched in order; the first failed fetch
//!   stops the fetch phase, but the purge pass still runs.
//! - A failed job is recorded and the run moves on to the next one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use backhaul_config::{JobConfig, load_job};
use backhaul_core::Clock;
use backhaul_fsops::ArchivePurger;
use backhaul_transfer::{CommandRunner, build_retriever};
use tracing::{error, info, info_span};

use crate::error::{AppError, error_chain};
use crate::report::{JobReport, JobStage, RunReport};

/// Drives configured jobs through fetch and purge.
pub struct RunOrchestrator {
    runner: Arc<dyn CommandRunner>,
    clock: Arc<dyn Clock>,
}

impl RunOrchestrator {
    /// Orchestrator executing remote commands through `runner` and dating copies with `clock`.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, clock: Arc<dyn Clock>) -> Self {
        Self { runner, clock }
    }

    /// Load and run every job in `sources`, in order.
    pub fn run(&self, sources: &[PathBuf]) -> RunReport {
        info!(jobs = sources.len(), "backup run starting");
        let jobs: Vec<JobReport> = sources.iter().map(|source| self.run_source(source)).collect();
        let report = RunReport { jobs };
        info!(
            jobs = report.jobs.len(),
            failed = report.failed_count(),
            "backup run finished"
        );
        report
    }

    fn run_source(&self, source: &Path) -> JobReport {
        match load_job(source) {
            Ok(job) => self.run_job(&job),
            Err(err) => {
                error!(
                    source = %source.display(),
                    error = %error_chain(&err),
                    "failed to load backup job"
                );
                let mut report = JobReport::new(source);
                report.record_failure(JobStage::Load, AppError::config("load_job", err));
                report
            }
        }
    }

    /// Fetch every instruction of `job`, then purge its backup directory.
    pub fn run_job(&self, job: &JobConfig) -> JobReport {
        let _span = info_span!("job", source = %job.source.display()).entered();
        info!(
            instructions = job.instructions.len(),
            transport = job.retriever.transport().as_str(),
            days_till_purge = job.retention.days_till_purge,
            "backup job starting"
        );

        let mut report = JobReport::new(&job.source);
        let retriever = build_retriever(&job.retriever, Arc::clone(&self.runner), Arc::clone(&self.clock));

        for (index, instruction) in job.instructions.iter().enumerate() {
            match retriever.fetch_one(instruction) {
                Ok(path) => report.fetched.push(path),
                Err(err) => {
                    let skipped = job.instructions.len() - index - 1;
                    error!(
                        staged_file = err.staged_file(),
                        error = %error_chain(&err),
                        skipped,
                        "fetch failed; skipping remaining instructions"
                    );
                    report.record_failure(JobStage::Fetch, AppError::retrieval("fetch_one", err));
                    break;
                }
            }
        }

        let purger = ArchivePurger::new(Arc::clone(&self.clock));
        match purger.purge(retriever.local_backup_dir(), &job.instructions, job.retention) {
            Ok(purge) => report.purge = Some(purge),
            Err(err) => {
                error!(error = %error_chain(&err), "purge pass failed");
                report.record_failure(JobStage::Purge, AppError::fsops("purge", err));
            }
        }

        match &report.failure {
            None => info!(fetched = report.fetched.len(), "backup job finished"),
            Some(failure) => error!(
                fetched = report.fetched.len(),
                stage = failure.stage.as_str(),
                "backup job failed"
            ),
        }
        report
    }
}
