//! Renderers for `check` results.

use std::fmt::Write as _;

use anyhow::anyhow;
use backhaul_app::JobCheck;
use backhaul_config::JobConfig;

use crate::cli::{CliError, CliResult, OutputFormat};

pub(crate) fn render_checks(checks: &[JobCheck], format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(checks)
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?,
        OutputFormat::Table => format_check_table(checks),
    };
    println!("{text}");
    Ok(())
}

fn format_check_table(checks: &[JobCheck]) -> String {
    let mut table = format!(
        "{:<7} {:<9} {:>5} {:>6} SOURCE",
        "STATUS", "TRANSPORT", "FILES", "KEEP"
    );
    for check in checks {
        table.push('\n');
        match &check.job {
            Some(job) => table.push_str(&job_row(job)),
            None => {
                let _ = write!(
                    table,
                    "{:<7} {:<9} {:>5} {:>6} {}",
                    "invalid",
                    "-",
                    "-",
                    "-",
                    check.source.display()
                );
                if let Some(error) = &check.error {
                    let _ = write!(table, "\n        {error}");
                }
            }
        }
    }
    table
}

fn job_row(job: &JobConfig) -> String {
    format!(
        "{:<7} {:<9} {:>5} {:>5}d {} -> {}",
        "ok",
        job.retriever.transport().as_str(),
        job.instructions.len(),
        job.retention.days_till_purge,
        job.source.display(),
        job.retriever.local_backup_dir().display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use backhaul_config::{RetrieverSettings, SecureCopySettings};
    use backhaul_core::{Instruction, RetentionPolicy};
    use std::path::PathBuf;

    fn job() -> JobConfig {
        JobConfig {
            source: PathBuf::from("jobs/db.properties"),
            instructions: vec![Instruction::new("db.sql.gz"), Instruction::new("photos.tgz")],
            retriever: RetrieverSettings::SecureCopy(SecureCopySettings {
                ssh_command: "ssh".to_string(),
                scp_command: "scp".to_string(),
                clean_script: None,
                user: None,
                remote_server: "vault".to_string(),
                remote_staging_dir: None,
                local_backup_dir: PathBuf::from("/srv/backups"),
            }),
            retention: RetentionPolicy::new(5),
        }
    }

    #[test]
    fn table_lists_valid_and_invalid_jobs() {
        let checks = [
            JobCheck {
                source: PathBuf::from("jobs/db.properties"),
                job: Some(job()),
                error: None,
            },
            JobCheck {
                source: PathBuf::from("jobs/bad.properties"),
                job: None,
                error: Some("unknown retriever transport 'ftp'".to_string()),
            },
        ];

        let table = format_check_table(&checks);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("STATUS"));
        assert!(lines[1].starts_with("ok"));
        assert!(lines[1].contains("scp"));
        assert!(lines[1].contains("5d jobs/db.properties -> /srv/backups"));
        assert!(lines[2].starts_with("invalid"));
        assert!(lines[3].trim_start().starts_with("unknown retriever transport"));
    }
}
