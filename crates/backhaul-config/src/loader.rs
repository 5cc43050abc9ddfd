//! Loading backup jobs and backup lists from disk.
//!
//! # Design
//! - A job file carries `instruction_N` entries read contiguously from 0, one
//!   `file_retriever`, and an optional `archive_schedule`.
//! - Keys outside that shape, including instructions past a gap, are logged and ignored.
//! - A backup list names one job file per line.
//! - Every loaded setting is logged once so a run log shows what it acted on.

use std::fs;
use std::path::{Path, PathBuf};

use backhaul_core::RetentionPolicy;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{JobConfig, RetrieverSettings};
use crate::properties::Properties;
use crate::validate::{parse_instruction, parse_retention, parse_tokens};

/// Key prefix of numbered instruction entries.
pub const INSTRUCTION_PREFIX: &str = "instruction_";
/// Key holding the retriever settings.
pub const FILE_RETRIEVER_KEY: &str = "file_retriever";
/// Key holding the archive schedule.
pub const ARCHIVE_SCHEDULE_KEY: &str = "archive_schedule";

/// Load and validate one job from a properties file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or any section is invalid.
pub fn load_job(path: &Path) -> ConfigResult<JobConfig> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::io("read properties file", path, source))?;
    let properties = Properties::parse(&text, path)?;
    job_from_properties(path, &properties)
}

/// Build a job from already parsed properties.
///
/// # Errors
///
/// Returns an error when no instructions are present, the retriever section is
/// missing or invalid, or the archive schedule is invalid.
pub fn job_from_properties(source: &Path, properties: &Properties) -> ConfigResult<JobConfig> {
    let mut instructions = Vec::new();
    for index in 0.. {
        let section = format!("{INSTRUCTION_PREFIX}{index}");
        let Some(value) = properties.get(&section) else {
            break;
        };
        let instruction = parse_instruction(&section, value)?;
        debug!(section = %section, instruction = %instruction, "loaded instruction");
        instructions.push(instruction);
    }
    if instructions.is_empty() {
        return Err(ConfigError::MissingField {
            section: source.display().to_string(),
            field: "instruction_0",
        });
    }

    for key in unrecognised_keys(properties, instructions.len()) {
        warn!(source = %source.display(), key, "ignoring unrecognised job property");
    }

    let retriever_value = properties
        .get(FILE_RETRIEVER_KEY)
        .ok_or_else(|| ConfigError::missing(&source.display().to_string(), FILE_RETRIEVER_KEY))?;
    let tokens = parse_tokens(FILE_RETRIEVER_KEY, retriever_value)?;
    let retriever = RetrieverSettings::from_properties(FILE_RETRIEVER_KEY, &tokens)?;
    log_retriever(&retriever);

    let retention = properties
        .get(ARCHIVE_SCHEDULE_KEY)
        .map_or_else(
            || Ok(RetentionPolicy::default()),
            |value| parse_retention(ARCHIVE_SCHEDULE_KEY, value),
        )?;
    info!(
        source = %source.display(),
        instructions = instructions.len(),
        transport = retriever.transport().as_str(),
        days_till_purge = retention.days_till_purge,
        "loaded backup job"
    );

    Ok(JobConfig {
        source: source.to_path_buf(),
        instructions,
        retriever,
        retention,
    })
}

fn unrecognised_keys(properties: &Properties, instruction_count: usize) -> Vec<&str> {
    properties
        .keys()
        .filter(|key| {
            if *key == FILE_RETRIEVER_KEY || *key == ARCHIVE_SCHEDULE_KEY {
                return false;
            }
            key.strip_prefix(INSTRUCTION_PREFIX)
                .and_then(|index| index.parse::<usize>().ok())
                .is_none_or(|index| index >= instruction_count)
        })
        .collect()
}

fn log_retriever(retriever: &RetrieverSettings) {
    match retriever {
        RetrieverSettings::SecureCopy(settings) => debug!(
            ssh_cmd = %settings.ssh_command,
            scp_cmd = %settings.scp_command,
            clean_script = ?settings.clean_script,
            user = ?settings.user,
            remote_server = %settings.remote_server,
            remote_staging_dir = ?settings.remote_staging_dir,
            local_backup_dir = %settings.local_backup_dir.display(),
            "loaded secure-copy retriever settings"
        ),
    }
}

/// Read a backup list: one job file path per line.
///
/// Blank lines and lines starting with `#` are skipped; paths are used as given.
///
/// # Errors
///
/// Returns an error when the list cannot be read.
pub fn load_backup_list(path: &Path) -> ConfigResult<Vec<PathBuf>> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::io("read backup list", path, source))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect())
}

/// Combine explicit job files and an optional backup list into run order.
///
/// Explicit files come first, followed by the backup list entries.
///
/// # Errors
///
/// Returns [`ConfigError::NoSources`] when nothing was supplied, or an error
/// when the backup list cannot be read.
pub fn collect_sources(
    properties: &[PathBuf],
    backup_list: Option<&Path>,
) -> ConfigResult<Vec<PathBuf>> {
    if properties.is_empty() && backup_list.is_none() {
        return Err(ConfigError::NoSources);
    }
    let mut sources = properties.to_vec();
    if let Some(list) = backup_list {
        sources.extend(load_backup_list(list)?);
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(text: &str) -> ConfigResult<Properties> {
        Properties::parse(text, Path::new("job.properties"))
    }

    const RETRIEVER: &str =
        "file_retriever=transport=scp,remote_server=example.org,local_backup_dir=/var/backups\n";

    #[test]
    fn job_reads_contiguous_instructions_only() -> anyhow::Result<()> {
        let text = format!(
            "instruction_0=remote_staged_file=files.tgz\n\
             instruction_1=remote_staged_file=photos.tgz\n\
             instruction_3=remote_staged_file=skipped.tgz\n{RETRIEVER}"
        );
        let job = job_from_properties(Path::new("job.properties"), &props(&text)?)?;
        let names: Vec<_> = job
            .instructions
            .iter()
            .map(|instruction| instruction.remote_staged_file.as_str())
            .collect();
        assert_eq!(names, ["files.tgz", "photos.tgz"]);
        assert_eq!(job.retention, RetentionPolicy::default());
        Ok(())
    }

    #[test]
    fn unrecognised_keys_include_gapped_instructions_and_typos() -> anyhow::Result<()> {
        let text = format!(
            "instruction_0=remote_staged_file=files.tgz
             instruction_2=remote_staged_file=orphan.tgz
             instruction_x=remote_staged_file=bad.tgz
             archive_schedual=days_till_purge=3
             archive_schedule=days_till_purge=3
{RETRIEVER}"
        );
        let properties = props(&text)?;
        assert_eq!(
            unrecognised_keys(&properties, 1),
            ["archive_schedual", "instruction_2", "instruction_x"]
        );
        assert!(job_from_properties(Path::new("job.properties"), &properties).is_ok());
        Ok(())
    }

    #[test]
    fn job_requires_instructions_and_retriever() -> anyhow::Result<()> {
        let no_instructions = props(RETRIEVER)?;
        assert!(matches!(
            job_from_properties(Path::new("job.properties"), &no_instructions),
            Err(ConfigError::MissingField {
                field: "instruction_0",
                ..
            })
        ));

        let no_retriever = props("instruction_0=remote_staged_file=db.sql.gz\n")?;
        assert!(matches!(
            job_from_properties(Path::new("job.properties"), &no_retriever),
            Err(ConfigError::MissingField {
                field: FILE_RETRIEVER_KEY,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn collect_sources_orders_explicit_files_first() -> anyhow::Result<()> {
        assert!(matches!(collect_sources(&[], None), Err(ConfigError::NoSources)));
        let sources = collect_sources(&[PathBuf::from("a.properties")], None)?;
        assert_eq!(sources, vec![PathBuf::from("a.properties")]);
        Ok(())
    }
}
