//! External command execution.
//!
//! Snapshot backends never spawn processes themselves; they hand a
//! [`ShellCommand`] to a [`CommandRunner`] and inspect the exit status.
//! Commands run to completion with no timeout.

use std::fmt;
use std::io;
use std::process::Command;
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Errors from command execution.
///
/// A non-zero exit status is not an error at this layer; see [`CommandOutput`].
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// A program and its arguments, executed without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Builder: append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for ShellCommand {
    /// Renders the command the way it would be typed in a shell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./@:=,+%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Trait for running external commands.
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion and capture its output.
    fn execute(&self, command: &ShellCommand) -> Result<CommandOutput, CommandError>;
}

/// Runs commands on the local host with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ShellRunner {
    fn execute(&self, command: &ShellCommand) -> Result<CommandOutput, CommandError> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // Killed by a signal
            exit_status: output.status.code().unwrap_or(1),
        })
    }
}

/// Mock runner for testing: records every command and answers from a script.
/// Cloning creates a new handle to the same recorded data.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    executed: Arc<RwLock<Vec<ShellCommand>>>,
    responses: Arc<RwLock<Vec<(String, CommandOutput)>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose rendered form contains `pattern` with `output`.
    /// The first matching pattern wins; unmatched commands succeed silently.
    pub fn respond(&self, pattern: impl Into<String>, output: CommandOutput) {
        self.responses.write().unwrap().push((pattern.into(), output));
    }

    /// Make commands containing `pattern` exit with `exit_status`.
    pub fn fail_when(&self, pattern: impl Into<String>, exit_status: i32) {
        self.respond(
            pattern,
            CommandOutput {
                exit_status,
                ..CommandOutput::default()
            },
        );
    }

    /// Make commands containing `pattern` succeed and print `stdout`.
    pub fn stdout_when(&self, pattern: impl Into<String>, stdout: impl Into<String>) {
        self.respond(
            pattern,
            CommandOutput {
                stdout: stdout.into(),
                ..CommandOutput::default()
            },
        );
    }

    /// All commands executed so far.
    pub fn executed(&self) -> Vec<ShellCommand> {
        self.executed.read().unwrap().clone()
    }

    /// All commands executed so far, rendered as shell lines.
    pub fn rendered(&self) -> Vec<String> {
        self.executed().iter().map(ToString::to_string).collect()
    }
}

impl CommandRunner for MockRunner {
    fn execute(&self, command: &ShellCommand) -> Result<CommandOutput, CommandError> {
        self.executed.write().unwrap().push(command.clone());

        let rendered = command.to_string();
        let output = self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(pattern, _)| rendered.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();

        Ok(output)
    }
}
