//! CLI argument parsing for poppins.
//!
//! Provides the command-line interface of the `poppins` binary with rotate,
//! list, and check subcommands.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use thiserror::Error;

/// Configuration file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/poppins/poppins.toml";

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("config path must not be empty")]
    EmptyConfigPath,
}

/// poppins - time-bucketed backup snapshot rotation.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "poppins")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Host configuration file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Increase verbosity (-v commands, -vv command output).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rotate the archive: admit new snapshots and evict old ones.
    Rotate(RotateArgs),
    /// Show the snapshots currently in the archive.
    List(ListArgs),
    /// Validate the configuration and show the resolved policy.
    Check,
}

/// Arguments for the rotate command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RotateArgs {
    /// Plan the rotation without touching the archive.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the list command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Print the listing as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.config.as_os_str().is_empty() {
            return Err(CliError::EmptyConfigPath);
        }
        Ok(())
    }
}

/// Parse CLI arguments from an iterator of strings.
/// Useful for testing.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // Subcommands
    // ===========================================

    #[test]
    fn test_subcommand_required() {
        assert!(parse_from(["poppins"]).is_err());
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(parse_from(["poppins", "collect"]).is_err());
    }

    #[test]
    fn test_rotate_defaults() {
        let cli = parse_from(["poppins", "rotate"]).expect("parse");
        assert_eq!(
            cli.command,
            Command::Rotate(RotateArgs {
                dry_run: false,
                json: false,
            })
        );
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_rotate_dry_run_json() {
        let cli = parse_from(["poppins", "rotate", "--dry-run", "--json"]).expect("parse");
        assert_eq!(
            cli.command,
            Command::Rotate(RotateArgs {
                dry_run: true,
                json: true,
            })
        );
    }

    #[test]
    fn test_list_json() {
        let cli = parse_from(["poppins", "list", "--json"]).expect("parse");
        assert_eq!(cli.command, Command::List(ListArgs { json: true }));
    }

    #[test]
    fn test_check_takes_no_flags() {
        assert_eq!(parse_from(["poppins", "check"]).expect("parse").command, Command::Check);
        assert!(parse_from(["poppins", "check", "--json"]).is_err());
        assert!(parse_from(["poppins", "list", "--dry-run"]).is_err());
    }

    // ===========================================
    // Global flags
    // ===========================================

    #[test]
    fn test_config_short_and_long() {
        let short = parse_from(["poppins", "-c", "/etc/poppins/web01.toml", "check"]).expect("parse");
        let long = parse_from(["poppins", "check", "--config", "/etc/poppins/web01.toml"]).expect("parse");

        assert_eq!(short.config, PathBuf::from("/etc/poppins/web01.toml"));
        assert_eq!(short, long);
    }

    #[test]
    fn test_verbose_counts() {
        let cli = parse_from(["poppins", "-v", "rotate"]).expect("parse");
        assert_eq!(cli.verbose, 1);

        let cli = parse_from(["poppins", "rotate", "-vv"]).expect("parse");
        assert_eq!(cli.verbose, 2);

        let cli = parse_from(["poppins", "-v", "list", "--verbose"]).expect("parse");
        assert_eq!(cli.verbose, 2);
    }

    // ===========================================
    // Validation
    // ===========================================

    #[test]
    fn test_validate_ok() {
        let cli = parse_from(["poppins", "check"]).expect("parse");
        assert_eq!(cli.validate(), Ok(()));
    }

    #[test]
    fn test_validate_empty_config_path() {
        let cli = Cli {
            config: PathBuf::new(),
            verbose: 0,
            command: Command::Check,
        };
        assert_eq!(cli.validate(), Err(CliError::EmptyConfigPath));
    }

    #[test]
    fn test_error_display_empty_config_path() {
        assert_eq!(CliError::EmptyConfigPath.to_string(), "config path must not be empty");
    }
}
