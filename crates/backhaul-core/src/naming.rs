//! Naming rules linking a remote staged file to its local archive copies.
//!
//! # Design
//! - A staged file `name.ext` is stored locally as `name_MMDDYYYY.ext`.
//! - The split happens at the first `.` of the base name, so `db.sql.gz` keeps `.sql.gz`.
//! - The purge pass matches every copy by the same stem, so both rules share `split_stem`.

use chrono::NaiveDate;

/// `chrono` format of the date stamp embedded in dated filenames.
pub const DATE_STAMP_FORMAT: &str = "%m%d%Y";

/// Trailing marker that makes a staged file name non-deterministic.
pub const WILDCARD_MARKER: char = '*';

/// Final path segment of a staged file name.
#[must_use]
pub fn staged_base_name(staged_file: &str) -> &str {
    staged_file
        .rsplit_once('/')
        .map_or(staged_file, |(_, base)| base)
}

/// Local file name for a copy of `staged_file` taken on `date`.
///
/// Returns an empty string when the staged name ends with [`WILDCARD_MARKER`]:
/// such names have no deterministic destination.
#[must_use]
pub fn dated_filename(staged_file: &str, date: NaiveDate) -> String {
    if staged_file.ends_with(WILDCARD_MARKER) {
        return String::new();
    }
    let (stem, extension) = split_stem(staged_base_name(staged_file));
    format!("{stem}_{}{extension}", date.format(DATE_STAMP_FORMAT))
}

/// Literal prefix shared by every archived copy of `staged_file`.
///
/// The purge pass appends a `*` wildcard to this prefix.
#[must_use]
pub fn purge_pattern_prefix(staged_file: &str) -> &str {
    split_stem(staged_base_name(staged_file)).0
}

fn split_stem(base: &str) -> (&str, &str) {
    base.find('.')
        .map_or((base, ""), |index| base.split_at(index))
}
