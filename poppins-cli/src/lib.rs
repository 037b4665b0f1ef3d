//! poppins CLI.
//!
//! This crate provides the command-line interface for the poppins snapshot
//! rotator. It handles argument parsing, configuration loading, and exit
//! codes.

pub mod cli;
pub mod commands;
pub mod config;
pub mod exit;

pub use cli::{parse_from, Cli, CliError, Command, ListArgs, RotateArgs, DEFAULT_CONFIG_PATH};
pub use commands::{
    execute, execute_check, execute_list, execute_rotate, render, CheckSummary, CommandFailure,
    CommandResult,
};
pub use config::{load_config, parse_config, ConfigError};
