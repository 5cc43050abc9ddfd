//! Typed configuration models for a backup job.
//!
//! # Design
//! - The retriever is a tagged variant resolved once, at load time, from a static name table.
//! - Settings are immutable after loading and shared by reference with the runtime crates.

use std::path::{Path, PathBuf};

use backhaul_core::{Instruction, RetentionPolicy};
use serde::Serialize;
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};

/// Default login command used when `ssh_cmd` is not configured.
pub const DEFAULT_SSH_COMMAND: &str = "ssh";
/// Default copy command used when `scp_cmd` is not configured.
pub const DEFAULT_SCP_COMMAND: &str = "scp";

/// Transport implementations known to the retriever registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Remote commands over `ssh`, file transfer over `scp`.
    SecureCopy,
}

const TRANSPORTS: &[(&str, TransportKind)] = &[
    ("scp", TransportKind::SecureCopy),
    ("ssh", TransportKind::SecureCopy),
    ("secure_copy", TransportKind::SecureCopy),
];

impl TransportKind {
    /// Resolve a transport from its configured identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTransport`] when no transport is registered under `name`.
    pub fn from_name(name: &str) -> ConfigResult<Self> {
        TRANSPORTS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ConfigError::UnknownTransport {
                value: name.to_string(),
            })
    }

    /// Canonical identifier used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SecureCopy => "scp",
        }
    }
}

/// Settings for the secure-copy retriever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecureCopySettings {
    /// Remote login command (`ssh_cmd`).
    pub ssh_command: String,
    /// Copy command (`scp_cmd`).
    pub scp_command: String,
    /// Remote script that clears a staged file after retrieval (`clean_script`).
    pub clean_script: Option<String>,
    /// User to connect as (`user`).
    pub user: Option<String>,
    /// Remote host (`remote_server`).
    pub remote_server: String,
    /// Remote directory holding staged files (`remote_staging_dir`).
    pub remote_staging_dir: Option<String>,
    /// Local directory receiving dated copies (`local_backup_dir`).
    pub local_backup_dir: PathBuf,
}

impl SecureCopySettings {
    /// Build settings from `file_retriever` tokens.
    ///
    /// # Errors
    ///
    /// Returns an error when `remote_server` or `local_backup_dir` is missing or empty.
    pub fn from_properties(section: &str, tokens: &[(&str, &str)]) -> ConfigResult<Self> {
        let mut ssh_command = None;
        let mut scp_command = None;
        let mut clean_script = None;
        let mut user = None;
        let mut remote_server = None;
        let mut remote_staging_dir = None;
        let mut local_backup_dir = None;

        for &(key, value) in tokens {
            let slot = match key {
                "ssh_cmd" => &mut ssh_command,
                "scp_cmd" => &mut scp_command,
                "clean_script" => &mut clean_script,
                "user" => &mut user,
                "remote_server" => &mut remote_server,
                "remote_staging_dir" => &mut remote_staging_dir,
                "local_backup_dir" => &mut local_backup_dir,
                "transport" | "class" => continue,
                other => {
                    warn!(section, key = other, "ignoring unknown retriever property");
                    continue;
                }
            };
            *slot = non_empty(value);
        }

        let remote_server =
            remote_server.ok_or_else(|| ConfigError::missing(section, "remote_server"))?;
        let local_backup_dir =
            local_backup_dir.ok_or_else(|| ConfigError::missing(section, "local_backup_dir"))?;

        Ok(Self {
            ssh_command: ssh_command.unwrap_or_else(|| DEFAULT_SSH_COMMAND.to_string()),
            scp_command: scp_command.unwrap_or_else(|| DEFAULT_SCP_COMMAND.to_string()),
            clean_script,
            user,
            remote_server,
            remote_staging_dir,
            local_backup_dir: PathBuf::from(local_backup_dir),
        })
    }

    /// `user@host`, or the bare host when no user is configured.
    #[must_use]
    pub fn connection_target(&self) -> String {
        self.user.as_ref().map_or_else(
            || self.remote_server.clone(),
            |user| format!("{user}@{}", self.remote_server),
        )
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Retriever selected for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum RetrieverSettings {
    /// Secure-copy retrieval.
    SecureCopy(SecureCopySettings),
}

impl RetrieverSettings {
    /// Resolve the transport named in `tokens` and parse its settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport is missing or unknown, or its settings are invalid.
    pub fn from_properties(section: &str, tokens: &[(&str, &str)]) -> ConfigResult<Self> {
        let name = tokens
            .iter()
            .find(|(key, _)| matches!(*key, "transport" | "class"))
            .map(|(_, value)| *value)
            .ok_or_else(|| ConfigError::missing(section, "transport"))?;

        match TransportKind::from_name(name)? {
            TransportKind::SecureCopy => Ok(Self::SecureCopy(SecureCopySettings::from_properties(
                section, tokens,
            )?)),
        }
    }

    /// Transport behind these settings.
    #[must_use]
    pub const fn transport(&self) -> TransportKind {
        match self {
            Self::SecureCopy(_) => TransportKind::SecureCopy,
        }
    }

    /// Local directory receiving retrieved copies.
    #[must_use]
    pub fn local_backup_dir(&self) -> &Path {
        match self {
            Self::SecureCopy(settings) => &settings.local_backup_dir,
        }
    }
}

/// One configuration unit: instructions, retriever, and retention policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobConfig {
    /// Properties file the job was loaded from.
    pub source: PathBuf,
    /// Ordered instructions.
    pub instructions: Vec<Instruction>,
    /// Retriever selected for the job.
    pub retriever: RetrieverSettings,
    /// Archive retention policy.
    pub retention: RetentionPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION: &str = "file_retriever";

    fn full_tokens() -> Vec<(&'static str, &'static str)> {
        vec![
            ("transport", "scp"),
            ("ssh_cmd", "/usr/bin/ssh"),
            ("scp_cmd", "/usr/bin/scp"),
            ("user", "backup"),
            ("remote_server", "example.org"),
            ("clean_script", "/srv/bin/clean.sh"),
            ("remote_staging_dir", "/srv/staging"),
            ("local_backup_dir", "/var/backups"),
        ]
    }

    #[test]
    fn transport_lookup_accepts_aliases_case_insensitively() -> anyhow::Result<()> {
        assert_eq!(TransportKind::from_name("scp")?, TransportKind::SecureCopy);
        assert_eq!(TransportKind::from_name("SSH")?, TransportKind::SecureCopy);
        assert!(matches!(
            TransportKind::from_name("ftp"),
            Err(ConfigError::UnknownTransport { ref value }) if value == "ftp"
        ));
        Ok(())
    }

    #[test]
    fn secure_copy_settings_parse_all_fields() -> anyhow::Result<()> {
        let RetrieverSettings::SecureCopy(settings) =
            RetrieverSettings::from_properties(SECTION, &full_tokens())?;
        assert_eq!(settings.ssh_command, "/usr/bin/ssh");
        assert_eq!(settings.scp_command, "/usr/bin/scp");
        assert_eq!(settings.clean_script.as_deref(), Some("/srv/bin/clean.sh"));
        assert_eq!(settings.remote_staging_dir.as_deref(), Some("/srv/staging"));
        assert_eq!(settings.local_backup_dir, PathBuf::from("/var/backups"));
        assert_eq!(settings.connection_target(), "backup@example.org");
        Ok(())
    }

    #[test]
    fn secure_copy_settings_apply_defaults() -> anyhow::Result<()> {
        let tokens = [
            ("class", "ssh"),
            ("remote_server", "example.org"),
            ("local_backup_dir", "/var/backups"),
            ("prep_script", "/ignored.sh"),
        ];
        let RetrieverSettings::SecureCopy(settings) =
            RetrieverSettings::from_properties(SECTION, &tokens)?;
        assert_eq!(settings.ssh_command, DEFAULT_SSH_COMMAND);
        assert_eq!(settings.scp_command, DEFAULT_SCP_COMMAND);
        assert_eq!(settings.clean_script, None);
        assert_eq!(settings.remote_staging_dir, None);
        assert_eq!(settings.connection_target(), "example.org");
        Ok(())
    }

    #[test]
    fn retriever_settings_require_transport_and_backup_dir() {
        assert!(matches!(
            RetrieverSettings::from_properties(SECTION, &[("remote_server", "example.org")]),
            Err(ConfigError::MissingField {
                field: "transport",
                ..
            })
        ));
        assert!(matches!(
            RetrieverSettings::from_properties(
                SECTION,
                &[("transport", "scp"), ("remote_server", "example.org")]
            ),
            Err(ConfigError::MissingField {
                field: "local_backup_dir",
                ..
            })
        ));
    }
}
