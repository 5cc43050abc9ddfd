//! Token parsing and field validation for comma-separated property values.

use backhaul_core::{Instruction, RetentionPolicy, WILDCARD_MARKER, purge_pattern_prefix};
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};

/// Split a `key=value,key=value` property value into ordered pairs.
///
/// Tokens split on their first `=`, so values may themselves contain `=`.
/// Empty tokens (for example a trailing comma) are skipped.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when a token has no `=` or an empty key.
pub fn parse_tokens<'a>(section: &str, value: &'a str) -> ConfigResult<Vec<(&'a str, &'a str)>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let (key, val) = token
                .split_once('=')
                .ok_or_else(|| ConfigError::invalid(section, token, None, "missing_separator"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::invalid(section, token, Some(val), "empty_key"));
            }
            Ok((key, val.trim()))
        })
        .collect()
}

/// Build an [`Instruction`] from an `instruction_N` property value.
///
/// # Errors
///
/// Returns an error when `remote_staged_file` is missing, empty, wildcard-suffixed,
/// or has an empty stem; or when `prep_script` is empty.
pub fn parse_instruction(section: &str, value: &str) -> ConfigResult<Instruction> {
    let mut staged_file = None;
    let mut prep_script = None;
    let mut args = Vec::new();

    for (key, val) in parse_tokens(section, value)? {
        match key {
            "remote_staged_file" => staged_file = Some(val),
            "prep_script" => {
                if val.is_empty() {
                    return Err(ConfigError::invalid(section, key, Some(val), "empty"));
                }
                prep_script = Some(val.to_string());
            }
            "arg" => args.push(val.to_string()),
            other => warn!(section, key = other, "ignoring unknown instruction property"),
        }
    }

    let staged_file = staged_file.ok_or_else(|| ConfigError::missing(section, "remote_staged_file"))?;
    validate_staged_file(section, staged_file)?;

    if prep_script.is_none() && !args.is_empty() {
        warn!(
            section,
            arg_count = args.len(),
            "instruction args are ignored without a prep_script"
        );
    }

    Ok(Instruction {
        remote_staged_file: staged_file.to_string(),
        prep_script,
        args,
    })
}

/// Build a [`RetentionPolicy`] from an `archive_schedule` property value.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when `days_till_purge` is not a
/// non-negative integer.
pub fn parse_retention(section: &str, value: &str) -> ConfigResult<RetentionPolicy> {
    let mut policy = RetentionPolicy::default();
    for (key, val) in parse_tokens(section, value)? {
        match key {
            "days_till_purge" => {
                policy.days_till_purge = val.parse::<u32>().map_err(|_| {
                    ConfigError::invalid(section, key, Some(val), "not_a_non_negative_integer")
                })?;
            }
            other => warn!(section, key = other, "ignoring unknown archive schedule property"),
        }
    }
    Ok(policy)
}

/// Reject staged file names that cannot produce a dated copy or a safe purge pattern.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for empty names, names ending with the
/// wildcard marker, and names whose stem before the first `.` is empty.
pub fn validate_staged_file(section: &str, staged_file: &str) -> ConfigResult<()> {
    let field = "remote_staged_file";
    if staged_file.is_empty() {
        return Err(ConfigError::invalid(section, field, Some(staged_file), "empty"));
    }
    if staged_file.ends_with(WILDCARD_MARKER) {
        return Err(ConfigError::invalid(
            section,
            field,
            Some(staged_file),
            "wildcard_name_has_no_dated_destination",
        ));
    }
    if purge_pattern_prefix(staged_file).is_empty() {
        return Err(ConfigError::invalid(
            section,
            field,
            Some(staged_file),
            "empty_stem",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tokens_preserves_order_and_embedded_equals() -> anyhow::Result<()> {
        let tokens = parse_tokens("s", "a=1, b = x=y ,,c=")?;
        assert_eq!(tokens, vec![("a", "1"), ("b", "x=y"), ("c", "")]);
        Ok(())
    }

    #[test]
    fn parse_tokens_rejects_bare_words() {
        assert!(matches!(
            parse_tokens("file_retriever", "transport=scp,oops"),
            Err(ConfigError::InvalidField { reason: "missing_separator", .. })
        ));
        assert!(matches!(
            parse_tokens("file_retriever", "=scp"),
            Err(ConfigError::InvalidField { reason: "empty_key", .. })
        ));
    }

    #[test]
    fn parse_instruction_collects_args_in_order() -> anyhow::Result<()> {
        let instruction = parse_instruction(
            "instruction_1",
            "remote_staged_file=photos.tgz,prep_script=/srv/bin/prep.sh,arg=/srv/images/photos,arg=photos.tgz",
        )?;
        assert_eq!(instruction.remote_staged_file, "photos.tgz");
        assert_eq!(instruction.prep_script.as_deref(), Some("/srv/bin/prep.sh"));
        assert_eq!(instruction.args, vec!["/srv/images/photos", "photos.tgz"]);
        Ok(())
    }

    #[test]
    fn parse_instruction_requires_staged_file() {
        assert!(matches!(
            parse_instruction("instruction_0", "prep_script=/srv/bin/prep.sh"),
            Err(ConfigError::MissingField {
                field: "remote_staged_file",
                ..
            })
        ));
    }

    #[test]
    fn parse_instruction_rejects_wildcards_and_empty_stems() {
        assert!(matches!(
            parse_instruction("instruction_0", "remote_staged_file=photos*"),
            Err(ConfigError::InvalidField {
                reason: "wildcard_name_has_no_dated_destination",
                ..
            })
        ));
        assert!(matches!(
            parse_instruction("instruction_0", "remote_staged_file=.hidden"),
            Err(ConfigError::InvalidField { reason: "empty_stem", .. })
        ));
        assert!(matches!(
            parse_instruction("instruction_0", "remote_staged_file="),
            Err(ConfigError::InvalidField { reason: "empty", .. })
        ));
    }

    #[test]
    fn parse_retention_defaults_and_validates() -> anyhow::Result<()> {
        assert_eq!(parse_retention("archive_schedule", "")?.days_till_purge, 0);
        assert_eq!(
            parse_retention("archive_schedule", "days_till_purge=5")?.days_till_purge,
            5
        );
        assert!(matches!(
            parse_retention("archive_schedule", "days_till_purge=-2"),
            Err(ConfigError::InvalidField {
                reason: "not_a_non_negative_integer",
                ..
            })
        ));
        Ok(())
    }
}
