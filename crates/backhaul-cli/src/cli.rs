//! Argument parsing and dispatch for the `backhaul` binary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use backhaul_app::{AppSettings, JobSources, check_app, error_chain, run_app};
use backhaul_telemetry::{DEFAULT_LOG_LEVEL, LogDestination, LogFormat, LoggingConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::render_checks;

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(&cli) {
        Ok(Outcome::Success) => 0,
        Ok(Outcome::JobsFailed(count)) => {
            eprintln!("error: {count} backup job(s) failed");
            1
        }
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "backhaul",
    version,
    about = "Retrieve staged remote backups and purge expired local copies"
)]
struct Cli {
    /// Append log lines to this file instead of the terminal.
    #[arg(long, global = true, env = "BACKHAUL_LOG_FILE", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Log level filter; `RUST_LOG` takes precedence when set.
    #[arg(long, global = true, env = "BACKHAUL_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
    /// Log line format; defaults to pretty in debug builds and JSON otherwise.
    #[arg(long, global = true, env = "BACKHAUL_LOG_FORMAT", value_enum)]
    log_format: Option<LogFormatArg>,
    /// Kill any remote command running longer than this many seconds.
    #[arg(long, global = true, env = "BACKHAUL_COMMAND_TIMEOUT_SECS", value_name = "SECS")]
    command_timeout: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch every configured staged file, then purge expired copies.
    Run(SourceArgs),
    /// Load and validate job files without contacting any host.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Job properties file; may be repeated.
    #[arg(long = "properties", value_name = "FILE")]
    properties: Vec<PathBuf>,
    /// File listing one job properties path per line.
    #[arg(long, value_name = "FILE")]
    backup_list: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[command(flatten)]
    sources: SourceArgs,
    /// Summary format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Success,
    JobsFailed(usize),
}

fn dispatch(cli: &Cli) -> CliResult<Outcome> {
    let command_timeout = parse_timeout(cli.command_timeout)?;
    match &cli.command {
        Command::Run(args) => {
            let sources = job_sources(args)?;
            let logging = logging_config(cli, LogDestination::Stdout);
            let settings = AppSettings {
                logging,
                command_timeout,
            };
            let report = run_app(&settings, &sources)
                .map_err(|err| CliError::failure(anyhow!(error_chain(&err))))?;
            Ok(if report.is_success() {
                Outcome::Success
            } else {
                Outcome::JobsFailed(report.failed_count())
            })
        }
        Command::Check(args) => {
            let sources = job_sources(&args.sources)?;
            let logging = logging_config(cli, LogDestination::Stderr);
            let settings = AppSettings {
                logging,
                command_timeout,
            };
            let checks = check_app(&settings, &sources)
                .map_err(|err| CliError::failure(anyhow!(error_chain(&err))))?;
            render_checks(&checks, args.output)?;
            let invalid = checks.iter().filter(|check| !check.is_valid()).count();
            Ok(if invalid == 0 {
                Outcome::Success
            } else {
                Outcome::JobsFailed(invalid)
            })
        }
    }
}

fn job_sources(args: &SourceArgs) -> CliResult<JobSources<'_>> {
    if args.properties.is_empty() && args.backup_list.is_none() {
        return Err(CliError::validation(
            "at least one job is required (pass --properties or --backup-list)",
        ));
    }
    Ok(JobSources {
        properties: &args.properties,
        backup_list: args.backup_list.as_deref(),
    })
}

fn parse_timeout(seconds: Option<u64>) -> CliResult<Option<Duration>> {
    match seconds {
        Some(0) => Err(CliError::validation(
            "command timeout must be at least one second",
        )),
        Some(seconds) => Ok(Some(Duration::from_secs(seconds))),
        None => Ok(None),
    }
}

fn logging_config<'a>(cli: &'a Cli, terminal: LogDestination<'static>) -> LoggingConfig<'a> {
    LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.map_or_else(LogFormat::infer, LogFormat::from),
        destination: cli
            .log_file
            .as_deref()
            .map_or(terminal, LogDestination::File),
    }
}

#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}
