//! Logging abstraction for testable output.
//!
//! Provides a trait-based logging system that enables deterministic testing
//! of log output without depending on global state.

use std::io::Write;
use std::sync::{Arc, RwLock};

/// How much output the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and notices (always shown)
    Normal,
    /// Every backend command (-v flag)
    Verbose,
    /// Command output and mapping details (-vv flag)
    Debug,
}

impl Verbosity {
    /// Create verbosity from CLI flag count.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    }
}

/// Level of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Warn,
    Notice,
    Verbose,
    Debug,
}

impl Level {
    /// Lowest verbosity at which this level is shown.
    pub fn shown_at(&self) -> Verbosity {
        match self {
            Level::Warn | Level::Notice => Verbosity::Normal,
            Level::Verbose => Verbosity::Verbose,
            Level::Debug => Verbosity::Debug,
        }
    }
}

/// Trait for logging output.
pub trait Logger: Send + Sync {
    /// Log a message at the given level.
    fn log(&self, level: Level, message: &str);

    /// Something the operator should act on.
    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    /// Progress the operator always sees.
    fn notice(&self, message: &str) {
        self.log(Level::Notice, message);
    }

    /// Log at verbose level (requires -v).
    fn verbose(&self, message: &str) {
        self.log(Level::Verbose, message);
    }

    /// Log at debug level (requires -vv).
    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }
}

/// Logger that writes to stderr.
#[derive(Debug)]
pub struct StderrLogger {
    verbosity: Verbosity,
}

impl StderrLogger {
    /// Create a new stderr logger with the given verbosity.
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl Logger for StderrLogger {
    fn log(&self, level: Level, message: &str) {
        if level.shown_at() > self.verbosity {
            return;
        }
        let _ = match level {
            Level::Warn => writeln!(std::io::stderr(), "warning: {}", message),
            _ => writeln!(std::io::stderr(), "{}", message),
        };
    }
}

/// Mock logger for testing that captures all messages.
#[derive(Debug, Clone, Default)]
pub struct MockLogger {
    messages: Arc<RwLock<Vec<LogEntry>>>,
}

/// A captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

impl MockLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured log entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.messages.read().unwrap().clone()
    }

    /// Get messages at a specific level.
    pub fn messages_at_level(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    /// Check if any message contains the given substring.
    pub fn contains(&self, substring: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(substring))
    }

    /// Get count of captured messages.
    pub fn count(&self) -> usize {
        self.messages.read().unwrap().len()
    }
}

impl Logger for MockLogger {
    fn log(&self, level: Level, message: &str) {
        // Captured regardless of level so tests can see everything
        self.messages.write().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }
}

/// A no-op logger that discards all messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) {}
}
