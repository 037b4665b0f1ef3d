//! Command orchestration for CLI subcommands.
//!
//! Provides execute functions for:
//! - `rotate` - Rotate the archive (or plan it with `--dry-run`)
//! - `list` - Show the archive contents
//! - `check` - Validate the configuration

pub mod check;
pub mod list;
pub mod rotate;

pub use check::{execute_check, CheckSummary};
pub use list::execute_list;
pub use rotate::execute_rotate;

use poppins_clock::Clock;
use poppins_fs::{CommandRunner, Filesystem};
use poppins_rotator::{Logger, Report, RotateError};
use thiserror::Error;

use crate::cli::{Cli, CliError, Command};
use crate::config::{load_config, ConfigError};

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandFailure {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Rotate(#[from] RotateError),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandFailure>;

/// Run the command selected on the command line and return its output.
pub fn execute<F, R, C, L>(cli: &Cli, fs: &F, runner: &R, clock: &C, logger: &L) -> CommandResult<String>
where
    F: Filesystem,
    R: CommandRunner,
    C: Clock,
    L: Logger,
{
    cli.validate()?;
    let config = load_config(fs, &cli.config)?;

    match &cli.command {
        Command::Rotate(args) => {
            let report = execute_rotate(args, &config, fs, runner, clock, logger)?;
            render(&report, args.json)
        }
        Command::List(args) => {
            let report = execute_list(&config, fs, runner, logger)?;
            render(&report, args.json)
        }
        Command::Check => Ok(execute_check(&cli.config, &config).to_string()),
    }
}

/// Format a report as text or pretty JSON.
pub fn render(report: &Report, json: bool) -> CommandResult<String> {
    if json {
        Ok(serde_json::to_string_pretty(report)? + "\n")
    } else {
        Ok(report.to_string())
    }
}
