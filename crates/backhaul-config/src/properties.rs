//! Parser for Java-style `.properties` files.
//!
//! # Design
//! - `#` and `!` start comment lines; blank lines are skipped.
//! - The key ends at the first unescaped `=`, `:`, or whitespace. Whitespace around
//!   the separator is skipped, so `key value`, `key = value`, and `key:value` agree.
//! - An odd number of trailing backslashes joins the next physical line, minus its
//!   leading whitespace.
//! - Keys and values are unescaped: `\t`, `\n`, `\r`, `\f`, `\uXXXX`, and any other
//!   `\c` as `c`.
//! - A line holding only a key is rejected; later keys override earlier ones.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Parsed key/value pairs from a single properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Parse properties text; `path` is only used for error context.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLine`] when a logical line has no separator,
    /// an empty key, or a malformed `\uXXXX` escape.
    pub fn parse(text: &str, path: &Path) -> ConfigResult<Self> {
        let mut entries = BTreeMap::new();
        let mut logical = String::new();
        let mut start_line = 0;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_start();
            if logical.is_empty() {
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                start_line = index + 1;
            }
            if let Some(joined) = strip_continuation(line) {
                logical.push_str(joined);
                continue;
            }
            logical.push_str(line);
            insert_entry(&mut entries, &logical, path, start_line)?;
            logical.clear();
        }

        if !logical.is_empty() {
            insert_entry(&mut entries, &logical, path, start_line)?;
        }

        Ok(Self { entries })
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate over keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn strip_continuation(line: &str) -> Option<&str> {
    let trailing = line.chars().rev().take_while(|ch| *ch == '\\').count();
    if trailing % 2 == 1 {
        Some(&line[..line.len() - 1])
    } else {
        None
    }
}

const fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\x0c')
}

/// Byte offsets of the raw key end and the raw value start, or `None` without a separator.
fn split_entry(logical: &str) -> Option<(usize, usize)> {
    let mut escaped = false;
    let mut key_end = None;
    for (index, ch) in logical.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '=' || ch == ':' || is_blank(ch) {
            key_end = Some(index);
            break;
        }
    }
    let key_end = key_end?;

    let rest = &logical[key_end..];
    let after_blanks = rest.trim_start_matches(is_blank);
    let after_separator = after_blanks
        .strip_prefix(['=', ':'])
        .unwrap_or(after_blanks)
        .trim_start_matches(is_blank);
    Some((key_end, logical.len() - after_separator.len()))
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut units: Vec<u16> = Vec::new();
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            flush_units(&mut units, &mut out);
            out.push(ch);
            continue;
        }
        let Some(next) = chars.next() else {
            break;
        };
        if next == 'u' {
            let hex: String = chars.by_ref().take(4).collect();
            if hex.len() != 4 {
                return None;
            }
            units.push(u16::from_str_radix(&hex, 16).ok()?);
            continue;
        }
        flush_units(&mut units, &mut out);
        out.push(match next {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'f' => '\x0c',
            other => other,
        });
    }
    flush_units(&mut units, &mut out);
    Some(out)
}

fn flush_units(units: &mut Vec<u16>, out: &mut String) {
    if units.is_empty() {
        return;
    }
    out.extend(
        char::decode_utf16(units.drain(..)).map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

fn insert_entry(
    entries: &mut BTreeMap<String, String>,
    logical: &str,
    path: &Path,
    line: usize,
) -> ConfigResult<()> {
    let invalid = || ConfigError::InvalidLine {
        path: path.to_path_buf(),
        line,
        content: logical.to_string(),
    };
    let (key_end, value_start) = split_entry(logical).ok_or_else(invalid)?;
    let key = unescape(&logical[..key_end]).ok_or_else(invalid)?;
    if key.is_empty() {
        return Err(invalid());
    }
    let value = unescape(&logical[value_start..]).ok_or_else(invalid)?;
    entries.insert(key, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ConfigResult<Properties> {
        Properties::parse(text, Path::new("test.properties"))
    }

    #[test]
    fn parses_comments_separators_and_overrides() -> anyhow::Result<()> {
        let props = parse(
            "# leading comment\n\
             ! bang comment\n\
             \n\
             archive_schedule = days_till_purge=5\n\
             file_retriever:transport=scp\n\
             archive_schedule=days_till_purge=7\n",
        )?;
        assert_eq!(props.keys().collect::<Vec<_>>(), ["archive_schedule", "file_retriever"]);
        assert_eq!(props.get("archive_schedule"), Some("days_till_purge=7"));
        assert_eq!(props.get("file_retriever"), Some("transport=scp"));
        assert_eq!(props.get("missing"), None);
        Ok(())
    }

    #[test]
    fn whitespace_separates_key_from_value() -> anyhow::Result<()> {
        let props = parse("instruction_0 remote_staged_file=db.sql.gz\nempty_value =\ntabbed\t:\tx y\n")?;
        assert_eq!(props.get("instruction_0"), Some("remote_staged_file=db.sql.gz"));
        assert_eq!(props.get("empty_value"), Some(""));
        assert_eq!(props.get("tabbed"), Some("x y"));
        Ok(())
    }

    #[test]
    fn escapes_are_decoded_in_keys_and_values() -> anyhow::Result<()> {
        let props = parse(
            "local_dir=C\\:\\\\backups\n\
             odd\\ key\\=name = a\\tb\n\
             greeting=caf\\u00e9 \\uD83D\\uDE00\n",
        )?;
        assert_eq!(props.get("local_dir"), Some("C:\\backups"));
        assert_eq!(props.get("odd key=name"), Some("a\tb"));
        assert_eq!(props.get("greeting"), Some("café 😀"));
        Ok(())
    }

    #[test]
    fn joins_continuation_lines() -> anyhow::Result<()> {
        let props = parse(
            "instruction_0=remote_staged_file=photos.tgz,\\\n\
             \x20   prep_script=/srv/bin/prep.sh,\\\n\
             \x20   arg=/srv/images/photos,\\\n\
             \x20   arg=photos.tgz\n",
        )?;
        assert_eq!(
            props.get("instruction_0"),
            Some(
                "remote_staged_file=photos.tgz,prep_script=/srv/bin/prep.sh,arg=/srv/images/photos,arg=photos.tgz"
            )
        );
        Ok(())
    }

    #[test]
    fn continuation_at_end_of_file_is_kept() -> anyhow::Result<()> {
        let props = parse("archive_schedule=days_till_purge=2,\\")?;
        assert_eq!(props.get("archive_schedule"), Some("days_till_purge=2,"));
        Ok(())
    }

    #[test]
    fn escaped_backslash_does_not_continue() -> anyhow::Result<()> {
        let props = parse("a=ends with \\\\\nb=next\n")?;
        assert_eq!(props.get("a"), Some("ends with \\"));
        assert_eq!(props.get("b"), Some("next"));
        Ok(())
    }

    #[test]
    fn rejects_bare_keys_empty_keys_and_bad_unicode() {
        assert!(matches!(
            parse("\n\nloneword\n"),
            Err(ConfigError::InvalidLine { line: 3, .. })
        ));
        assert!(matches!(
            parse("=value\n"),
            Err(ConfigError::InvalidLine { line: 1, .. })
        ));
        assert!(matches!(
            parse("a=\\u12\n"),
            Err(ConfigError::InvalidLine { line: 1, .. })
        ));
        assert!(matches!(
            parse("a=\\uzzzz\n"),
            Err(ConfigError::InvalidLine { line: 1, .. })
        ));
    }
}
