//! Process-level setup shared by the `run` and `check` commands.
//!
//! # Design
//! - Logging is installed once per process, then a `run` span stays entered for
//!   the whole command.
//! - Production dependencies (system runner, system clock) are built here and
//!   injected into the orchestrator.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use backhaul_config::{collect_sources, load_job};
use backhaul_core::SystemClock;
use backhaul_telemetry::{LoggingConfig, RunContextGuard, init_logging};
use backhaul_transfer::SystemCommandRunner;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, error_chain};
use crate::orchestrator::RunOrchestrator;
use crate::report::{JobCheck, RunReport};

/// Process-wide settings supplied by the command line.
#[derive(Debug, Clone, Copy)]
pub struct AppSettings<'a> {
    /// Logging configuration.
    pub logging: LoggingConfig<'a>,
    /// Kill remote commands running longer than this.
    pub command_timeout: Option<Duration>,
}

/// Where job definitions come from.
#[derive(Debug, Clone, Copy)]
pub struct JobSources<'a> {
    /// Properties files named directly, run first.
    pub properties: &'a [PathBuf],
    /// Optional file listing further properties files.
    pub backup_list: Option<&'a Path>,
}

impl JobSources<'_> {
    fn collect(&self) -> AppResult<Vec<PathBuf>> {
        collect_sources(self.properties, self.backup_list)
            .map_err(|err| AppError::config("collect_sources", err))
    }
}

/// Run every configured job once.
///
/// # Errors
///
/// Returns an error when logging cannot be installed or the job sources cannot
/// be read. Job failures are reported in the returned [`RunReport`].
pub fn run_app(settings: &AppSettings<'_>, sources: &JobSources<'_>) -> AppResult<RunReport> {
    init_logging(&settings.logging).map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let context = RunContextGuard::new("run");
    info!(
        run_id = %context.run_id(),
        version = env!("CARGO_PKG_VERSION"),
        "backhaul run starting"
    );

    let sources = sources.collect()?;
    let orchestrator = RunOrchestrator::new(
        Arc::new(build_runner(settings.command_timeout)),
        Arc::new(SystemClock),
    );
    let report = orchestrator.run(&sources);
    info!(success = report.is_success(), "finished");
    Ok(report)
}

/// Load and validate every configured job without running any command.
///
/// # Errors
///
/// Returns an error when logging cannot be installed or the job sources cannot
/// be read. Invalid jobs are reported in the returned checks.
pub fn check_app(settings: &AppSettings<'_>, sources: &JobSources<'_>) -> AppResult<Vec<JobCheck>> {
    init_logging(&settings.logging).map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let context = RunContextGuard::new("check");
    info!(run_id = %context.run_id(), "backhaul check starting");

    let checks = check_sources(&sources.collect()?);
    info!(
        jobs = checks.len(),
        invalid = checks.iter().filter(|check| !check.is_valid()).count(),
        "finished"
    );
    Ok(checks)
}

pub(crate) fn check_sources(sources: &[PathBuf]) -> Vec<JobCheck> {
    sources
        .iter()
        .map(|source| {
            let loaded = load_job(source);
            if let Err(err) = &loaded {
                warn!(source = %source.display(), error = %error_chain(err), "invalid backup job");
            }
            JobCheck::from_load(source, loaded)
        })
        .collect()
}

fn build_runner(timeout: Option<Duration>) -> SystemCommandRunner {
    timeout.map_or_else(SystemCommandRunner::new, |timeout| {
        SystemCommandRunner::new().with_timeout(timeout)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use backhaul_config::ConfigError;
    use backhaul_test_support::fixtures::{scratch_dir, write_file};

    #[test]
    fn sources_require_at_least_one_input() {
        let sources = JobSources {
            properties: &[],
            backup_list: None,
        };
        assert!(matches!(
            sources.collect(),
            Err(AppError::Config {
                source: ConfigError::NoSources,
                ..
            })
        ));
    }

    #[test]
    fn check_reports_valid_and_invalid_jobs() -> anyhow::Result<()> {
        let dir = scratch_dir("backhaul-check-")?;
        let valid = write_file(
            dir.path(),
            "valid.properties",
            "instruction_0=remote_staged_file=db.sql.gz\n\
             file_retriever=transport=scp,remote_server=vault,local_backup_dir=/srv/backups\n\
             archive_schedule=days_till_purge=5\n",
        )?;
        let invalid = write_file(
            dir.path(),
            "invalid.properties",
            "instruction_0=remote_staged_file=db.sql.gz\n\
             file_retriever=transport=ftp,remote_server=vault\n",
        )?;

        let checks = check_sources(&[valid, invalid]);

        assert!(checks[0].is_valid());
        assert_eq!(
            checks[0].job.as_ref().map(|job| job.retention.days_till_purge),
            Some(5)
        );
        assert!(!checks[1].is_valid());
        assert!(
            checks[1]
                .error
                .as_deref()
                .is_some_and(|error| error.contains("ftp"))
        );
        Ok(())
    }

    #[test]
    fn runner_carries_configured_timeout() {
        assert_eq!(build_runner(None).timeout(), None);
        assert_eq!(
            build_runner(Some(Duration::from_secs(30))).timeout(),
            Some(Duration::from_secs(30))
        );
    }
}
