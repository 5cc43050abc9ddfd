//! Scratch directories and file helpers.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Length of one archive day.
pub const DAY: Duration = Duration::from_secs(86_400);

/// Create a scratch directory that is removed when dropped.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn scratch_dir(prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .context("failed to create scratch directory")
}

/// Write `contents` to `dir/name`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Set the modification time of `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its times updated.
pub fn set_modified(path: &Path, modified: SystemTime) -> Result<()> {
    File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(modified))
        .with_context(|| format!("failed to set mtime on {}", path.display()))
}

/// Backdate `path` so it was last modified `age` before `now`.
///
/// # Errors
///
/// Returns an error if `now - age` underflows or the mtime cannot be set.
pub fn age_file(path: &Path, now: SystemTime, age: Duration) -> Result<()> {
    let modified = now
        .checked_sub(age)
        .context("requested file age precedes the epoch")?;
    set_modified(path, modified)
}

/// Sorted file names directly under `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}
