//! Stand-in `ssh` and `scp` executables for exercising the secure-copy transport locally.
//!
//! Both stubs append their argument list to a shared invocation log before doing
//! anything else. The `scp` stub treats everything after the first `:` of its
//! source argument as a local path and copies it to the destination. The `ssh`
//! stub prints a progress line, the sentinel, and one trailing line.
//! Failures are armed with marker files; an armed stub prints the marker to
//! stderr and exits non-zero.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use backhaul_core::EOF_SENTINEL;

/// Stub transport commands installed in a directory.
#[derive(Debug, Clone)]
pub struct StubTransport {
    dir: PathBuf,
    log: PathBuf,
}

impl StubTransport {
    /// Install `ssh` and `scp` stubs into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scripts cannot be written or made executable.
    pub fn install(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let log = dir.join("invocations.log");
        let stub = Self {
            dir: dir.to_path_buf(),
            log,
        };

        stub.write_script(
            "ssh",
            &format!(
                "script_marker=\"{dir}/ssh-$(basename \"$2\").stderr\"\n\
                 if [ -f \"$script_marker\" ]; then cat \"$script_marker\" >&2; exit 1; fi\n\
                 echo \"preparing $2\"\n\
                 echo \"{EOF_SENTINEL}\"\n\
                 echo \"after sentinel\"\n",
                dir = stub.dir.display()
            ),
        )?;
        stub.write_script(
            "scp",
            "src=\"${1#*:}\"\n\
             cp \"$src\" \"$2\"\n",
        )?;
        Ok(stub)
    }

    /// Path of the `ssh` stub.
    #[must_use]
    pub fn ssh_path(&self) -> PathBuf {
        self.dir.join("ssh")
    }

    /// Path of the `scp` stub.
    #[must_use]
    pub fn scp_path(&self) -> PathBuf {
        self.dir.join("scp")
    }

    /// Make every later `ssh` call print `message` to stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker file cannot be written.
    pub fn fail_ssh(&self, message: &str) -> Result<()> {
        fs::write(self.dir.join("ssh.stderr"), message).context("failed to arm ssh failure")
    }

    /// Make later `ssh` calls running the remote script `script` print `message` to stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker file cannot be written.
    pub fn fail_remote_script(&self, script: &str, message: &str) -> Result<()> {
        let name = Path::new(script)
            .file_name()
            .map_or_else(|| script.to_string(), |name| name.to_string_lossy().into_owned());
        fs::write(self.dir.join(format!("ssh-{name}.stderr")), message)
            .context("failed to arm remote script failure")
    }

    /// Make every later `scp` call print `message` to stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker file cannot be written.
    pub fn fail_scp(&self, message: &str) -> Result<()> {
        fs::write(self.dir.join("scp.stderr"), message).context("failed to arm scp failure")
    }

    /// Logged invocations in call order, one line per call.
    ///
    /// # Errors
    ///
    /// Returns an error if the log exists but cannot be read.
    pub fn invocations(&self) -> Result<Vec<String>> {
        if !self.log.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.log)
            .with_context(|| format!("failed to read {}", self.log.display()))?;
        Ok(text.lines().map(str::to_string).collect())
    }

    fn write_script(&self, name: &str, body: &str) -> Result<()> {
        let path = self.dir.join(name);
        let stderr_marker = self.dir.join(format!("{name}.stderr"));
        let script = format!(
            "#!/bin/sh\n\
             echo \"{name} $*\" >> \"{log}\"\n\
             if [ -f \"{marker}\" ]; then cat \"{marker}\" >&2; exit 1; fi\n\
             {body}",
            log = self.log.display(),
            marker = stderr_marker.display()
        );
        fs::write(&path, script).with_context(|| format!("failed to write {}", path.display()))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("failed to mark {} executable", path.display()))?;
        Ok(())
    }
}
