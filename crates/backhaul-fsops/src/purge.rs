//! Age-based purge of archived copies.
//!
//! # Design
//! - One glob per instruction: the escaped stem of the staged file followed by `*`.
//! - Only regular files directly inside the backup directory are considered.
//! - Age is whole days since the last modification, floored; a copy is purged
//!   when its age is strictly greater than the retention window.
//! - Per-file failures are logged and collected; they never stop the pass.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use backhaul_core::{Clock, Instruction, RetentionPolicy, purge_pattern_prefix};
use chrono::{DateTime, Local};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};
use crate::report::{PurgeReport, PurgeWarning};

const MILLIS_PER_DAY: i64 = 86_400_000;

type RemoveFn = fn(&Path) -> io::Result<()>;

/// Whole days between `modified` and `now`, floored. Negative for future timestamps.
#[must_use]
pub fn age_in_days(now: DateTime<Local>, modified: SystemTime) -> i64 {
    let modified = DateTime::<Local>::from(modified);
    (now - modified).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Deletes archived copies older than a job's retention window.
pub struct ArchivePurger {
    clock: Arc<dyn Clock>,
    remove: RemoveFn,
}

impl ArchivePurger {
    /// Purger measuring ages against `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            remove: |path| fs::remove_file(path),
        }
    }

    #[cfg(test)]
    fn with_remove(mut self, remove: RemoveFn) -> Self {
        self.remove = remove;
        self
    }

    /// Remove expired copies of every instruction's staged file from `dir`.
    ///
    /// A missing `dir` is logged and yields an empty report.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Glob`] when a purge pattern cannot be compiled.
    pub fn purge(
        &self,
        dir: &Path,
        instructions: &[Instruction],
        retention: RetentionPolicy,
    ) -> FsOpsResult<PurgeReport> {
        let patterns = compile_patterns(instructions)?;
        let mut report = PurgeReport::default();

        if !dir.is_dir() {
            warn!(path = %dir.display(), "backup directory missing; nothing to purge");
            return Ok(report);
        }

        let now = self.clock.now();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(dir).to_path_buf();
                    warn!(error = %err, path = %path.display(), "failed to traverse backup directory");
                    report.warnings.push(PurgeWarning {
                        path,
                        operation: "traverse",
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() || !patterns.is_match(entry.file_name()) {
                continue;
            }
            report.examined += 1;

            let path = entry.path();
            let modified = match fs::metadata(path).and_then(|meta| meta.modified()) {
                Ok(modified) => modified,
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "failed to read archived copy timestamp");
                    report.warnings.push(PurgeWarning {
                        path: path.to_path_buf(),
                        operation: "stat",
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let age_days = age_in_days(now, modified);
            if !retention.is_expired(age_days) {
                debug!(path = %path.display(), age_days, "retaining archived copy");
                report.retained += 1;
                continue;
            }

            match (self.remove)(path) {
                Ok(()) => {
                    info!(
                        path = %path.display(),
                        age_days,
                        days_till_purge = retention.days_till_purge,
                        "purged archived copy"
                    );
                    report.purged.push(path.to_path_buf());
                }
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "failed to remove archived copy");
                    report.warnings.push(PurgeWarning {
                        path: path.to_path_buf(),
                        operation: "remove",
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            path = %dir.display(),
            examined = report.examined,
            purged = report.purged.len(),
            warnings = report.warnings.len(),
            "purge pass finished"
        );
        Ok(report)
    }
}

fn compile_patterns(instructions: &[Instruction]) -> FsOpsResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for instruction in instructions {
        let prefix = purge_pattern_prefix(&instruction.remote_staged_file);
        if prefix.is_empty() {
            warn!(
                staged_file = %instruction.remote_staged_file,
                "staged file has an empty stem; skipping purge pattern"
            );
            continue;
        }
        let pattern = format!("{}*", globset::escape(prefix));
        let glob = Glob::new(&pattern)
            .map_err(|source| FsOpsError::glob("compile_purge_pattern", pattern.clone(), source))?;
        debug!(pattern = %pattern, "compiled purge pattern");
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| FsOpsError::glob("build_purge_patterns", "<set>".to_string(), source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backhaul_core::FixedClock;
    use backhaul_test_support::fixtures::{DAY, age_file, list_names, scratch_dir, write_file};
    use chrono::TimeZone;
    use std::time::Duration;

    fn now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 15, 12, 0, 0)
            .single()
            .unwrap_or_else(Local::now)
    }

    fn purger() -> ArchivePurger {
        ArchivePurger::new(Arc::new(FixedClock::new(now())))
    }

    #[test]
    fn age_is_floored_to_whole_days() {
        let now = now();
        let base = SystemTime::from(now);
        assert_eq!(age_in_days(now, base), 0);
        assert_eq!(age_in_days(now, base - DAY + Duration::from_secs(1)), 0);
        assert_eq!(age_in_days(now, base - DAY), 1);
        assert_eq!(age_in_days(now, base - DAY * 6 - Duration::from_secs(3600)), 6);
        assert_eq!(age_in_days(now, base + Duration::from_secs(60)), -1);
    }

    #[test]
    fn only_copies_older_than_window_are_purged() -> anyhow::Result<()> {
        let dir = scratch_dir("backhaul-purge-")?;
        let now = SystemTime::from(now());
        for (name, days) in [("db_03092024.sql.gz", 6), ("db_03102024.sql.gz", 5), ("db_03142024.sql.gz", 1)] {
            let path = write_file(dir.path(), name, "x")?;
            age_file(&path, now, DAY * days)?;
        }

        let report = purger().purge(
            dir.path(),
            &[Instruction::new("db.sql.gz")],
            RetentionPolicy::new(5),
        )?;

        assert_eq!(report.examined, 3);
        assert_eq!(report.retained, 2);
        assert_eq!(report.purged, vec![dir.path().join("db_03092024.sql.gz")]);
        assert!(report.is_clean());
        assert_eq!(
            list_names(dir.path())?,
            vec!["db_03102024.sql.gz".to_string(), "db_03142024.sql.gz".to_string()]
        );
        Ok(())
    }

    #[test]
    fn failed_removal_is_a_warning_and_the_pass_continues() -> anyhow::Result<()> {
        let dir = scratch_dir("backhaul-purge-")?;
        let now = SystemTime::from(now());
        let locked = write_file(dir.path(), "db_03012024.sql.gz", "x")?;
        age_file(&locked, now, DAY * 14)?;
        let stale = write_file(dir.path(), "db_03052024.sql.gz", "x")?;
        age_file(&stale, now, DAY * 10)?;

        let purger = purger().with_remove(|path| {
            if path.ends_with("db_03012024.sql.gz") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only archive"))
            } else {
                fs::remove_file(path)
            }
        });
        let report = purger.purge(dir.path(), &[Instruction::new("db.sql.gz")], RetentionPolicy::new(5))?;

        assert_eq!(report.examined, 2);
        assert_eq!(report.purged, vec![stale.clone()]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].operation, "remove");
        assert_eq!(report.warnings[0].path, locked);
        assert!(report.warnings[0].reason.contains("read-only archive"));
        assert!(!report.is_clean());
        assert!(locked.exists());
        assert!(!stale.exists());
        Ok(())
    }

    #[test]
    fn zero_day_window_keeps_same_day_copies() -> anyhow::Result<()> {
        let dir = scratch_dir("backhaul-purge-")?;
        let now = SystemTime::from(now());
        let fresh = write_file(dir.path(), "logs_03152024.tgz", "x")?;
        age_file(&fresh, now, Duration::from_secs(3600))?;
        let old = write_file(dir.path(), "logs_03142024.tgz", "x")?;
        age_file(&old, now, DAY)?;

        let report = purger().purge(dir.path(), &[Instruction::new("logs.tgz")], RetentionPolicy::default())?;

        assert_eq!(report.purged, vec![old]);
        assert_eq!(list_names(dir.path())?, vec!["logs_03152024.tgz".to_string()]);
        Ok(())
    }

    #[test]
    fn stem_prefix_also_matches_longer_names() -> anyhow::Result<()> {
        let dir = scratch_dir("backhaul-purge-")?;
        let now = SystemTime::from(now());
        for name in [
            "photos_03152024.tgz",
            "photosynth.tgz",
            "photographs.tgz",
            "Photos_03152024.tgz",
            "db[1]_x.gz",
            "db1_x.gz",
        ] {
            let path = write_file(dir.path(), name, "x")?;
            age_file(&path, now, DAY * 30)?;
        }

        let report = purger().purge(
            dir.path(),
            &[Instruction::new("photos.tgz"), Instruction::new("db[1].gz")],
            RetentionPolicy::new(7),
        )?;

        assert_eq!(report.purged.len(), 3);
        assert_eq!(
            list_names(dir.path())?,
            vec![
                "Photos_03152024.tgz".to_string(),
                "db1_x.gz".to_string(),
                "photographs.tgz".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn directories_and_nested_files_are_ignored() -> anyhow::Result<()> {
        let dir = scratch_dir("backhaul-purge-")?;
        let now = SystemTime::from(now());
        let nested_dir = dir.path().join("db_old");
        fs::create_dir(&nested_dir)?;
        let nested = write_file(&nested_dir, "db_01012020.sql.gz", "x")?;
        age_file(&nested, now, DAY * 400)?;

        let report = purger().purge(dir.path(), &[Instruction::new("db.sql.gz")], RetentionPolicy::new(1))?;

        assert_eq!(report.examined, 0);
        assert!(nested.exists());
        Ok(())
    }

    #[test]
    fn second_pass_deletes_nothing() -> anyhow::Result<()> {
        let dir = scratch_dir("backhaul-purge-")?;
        let now = SystemTime::from(now());
        let path = write_file(dir.path(), "db_01012024.sql.gz", "x")?;
        age_file(&path, now, DAY * 10)?;
        let instructions = [Instruction::new("db.sql.gz")];

        let first = purger().purge(dir.path(), &instructions, RetentionPolicy::new(2))?;
        let second = purger().purge(dir.path(), &instructions, RetentionPolicy::new(2))?;

        assert_eq!(first.purged.len(), 1);
        assert_eq!(second, PurgeReport::default());
        Ok(())
    }

    #[test]
    fn missing_directory_yields_empty_report() -> anyhow::Result<()> {
        let dir = scratch_dir("backhaul-purge-")?;
        let report = purger().purge(
            &dir.path().join("absent"),
            &[Instruction::new("db.sql.gz")],
            RetentionPolicy::new(0),
        )?;
        assert_eq!(report, PurgeReport::default());
        Ok(())
    }

    #[test]
    fn empty_stem_contributes_no_pattern() -> anyhow::Result<()> {
        let dir = scratch_dir("backhaul-purge-")?;
        let now = SystemTime::from(now());
        let path = write_file(dir.path(), "unrelated.txt", "x")?;
        age_file(&path, now, DAY * 10)?;

        let report = purger().purge(dir.path(), &[Instruction::new(".bashrc")], RetentionPolicy::new(0))?;

        assert_eq!(report.examined, 0);
        assert!(path.exists());
        Ok(())
    }
}
