//! External command execution.
//!
//! # Design
//! - `CommandRunner::execute` only spawns and captures; the failure policy lives in
//!   the provided `run` method so every runner shares it.
//! - Anything written to stderr fails the command. A non-zero exit with a silent
//!   stderr is only a warning.
//! - Stdout and stderr are drained on separate threads so neither pipe can fill up
//!   and block the child.
//! - A timed-out command returns once the child is killed; the reader threads are
//!   detached rather than joined.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use backhaul_core::EOF_SENTINEL;
use tracing::{debug, error, info, warn};

use crate::error::{ExecResult, ExecutionError};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Program plus arguments, passed to the OS without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Start a command line for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments in order.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured outcome of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Stdout lines preceding the sentinel (all lines when none was printed).
    pub stdout: Vec<String>,
    /// Every stderr line.
    pub stderr: Vec<String>,
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Whether the sentinel line appeared on stdout.
    pub sentinel_seen: bool,
}

impl ExecutionResult {
    /// Stderr lines joined with single spaces.
    #[must_use]
    pub fn stderr_text(&self) -> String {
        self.stderr.join(" ")
    }
}

/// Executes external commands.
pub trait CommandRunner: Send + Sync {
    /// Spawn `command`, wait for it, and capture its output.
    ///
    /// Implementations report only spawn, stream, and timeout problems here;
    /// stderr content is judged by [`CommandRunner::run`].
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Spawn`], [`ExecutionError::Stream`], or
    /// [`ExecutionError::TimedOut`].
    fn execute(&self, command: &CommandLine) -> ExecResult<ExecutionResult>;

    /// Run `command`, logging it first, and fail when it wrote to stderr.
    ///
    /// # Errors
    ///
    /// Everything [`CommandRunner::execute`] returns, plus
    /// [`ExecutionError::ErrorOutput`] when stderr was not empty.
    fn run(&self, command: &CommandLine) -> ExecResult<ExecutionResult> {
        info!(command = %command, "executing command");
        let result = self
            .execute(command)
            .inspect_err(|err| error!(command = %command, error = %err, "command failed to run"))?;

        if !result.stderr.is_empty() {
            let stderr = result.stderr_text();
            error!(command = %command, stderr = %stderr, "command wrote to stderr");
            return Err(ExecutionError::ErrorOutput {
                command: command.to_string(),
                stderr,
                exit_code: result.exit_code,
            });
        }

        match result.exit_code {
            Some(0) => {}
            Some(code) => warn!(command = %command, exit_code = code, "command exited non-zero"),
            None => warn!(command = %command, "command terminated by signal"),
        }
        if !result.sentinel_seen {
            debug!(command = %command, "command output ended without sentinel");
        }
        Ok(result)
    }
}

/// Runs commands as child processes of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner {
    timeout: Option<Duration>,
}

impl SystemCommandRunner {
    /// Runner without a timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill commands that run longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl CommandRunner for SystemCommandRunner {
    fn execute(&self, command: &CommandLine) -> ExecResult<ExecutionResult> {
        let rendered = command.to_string();
        let mut child = Command::new(command.program())
            .args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .map(|pipe| thread::spawn(move || drain(pipe, Some(EOF_SENTINEL))));
        let stderr = child
            .stderr
            .take()
            .map(|pipe| thread::spawn(move || drain(pipe, None)));

        let stream_error = |source: io::Error| ExecutionError::Stream {
            command: rendered.clone(),
            source,
        };
        let status = match self.timeout {
            None => child.wait().map_err(stream_error)?,
            Some(timeout) => match wait_with_deadline(&mut child, timeout).map_err(stream_error)? {
                Some(status) => status,
                None => {
                    // Grandchildren may still hold the pipes open; detach the readers.
                    drop((stdout, stderr));
                    return Err(ExecutionError::TimedOut {
                        command: command.to_string(),
                        timeout,
                    });
                }
            },
        };

        let stdout = join(stdout).map_err(stream_error)?;
        let stderr = join(stderr).map_err(stream_error)?;

        Ok(ExecutionResult {
            stdout: stdout.lines,
            stderr: stderr.lines,
            exit_code: status.code(),
            sentinel_seen: stdout.sentinel_seen,
        })
    }
}

#[derive(Debug, Default)]
struct Captured {
    lines: Vec<String>,
    sentinel_seen: bool,
}

/// Read `pipe` to the end. Lines after `sentinel` are read but not kept.
fn drain<R: Read>(pipe: R, sentinel: Option<&str>) -> io::Result<Captured> {
    let mut reader = BufReader::new(pipe);
    let mut captured = Captured::default();
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(captured);
        }
        if captured.sentinel_seen {
            continue;
        }
        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim_end_matches(['\n', '\r']);
        if sentinel.is_some_and(|sentinel| line == sentinel) {
            captured.sentinel_seen = true;
        } else {
            captured.lines.push(line.to_string());
        }
    }
}

fn join(handle: Option<JoinHandle<io::Result<Captured>>>) -> io::Result<Captured> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| io::Error::other("output reader thread panicked"))?,
        None => Ok(Captured::default()),
    }
}

/// Wait for `child` until `timeout` elapses. Returns `None` after killing it.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
