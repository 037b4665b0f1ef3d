//! Clock abstraction for poppins.
//!
//! Provides a trait for getting the current time as a [`Dirstamp`], with both
//! real and mock implementations to enable deterministic testing, plus the
//! calendar-naive interval arithmetic used by snapshot retention.
//!
//! Dirstamps are UTC. Local wall time repeats an hour when daylight saving
//! ends, which would make a fresh stamp older than the previous one.

pub mod dirstamp;
pub mod interval;

pub use dirstamp::{Dirstamp, DIRSTAMP_FORMAT};
pub use interval::{exceeds, threshold_secs, Interval};

use chrono::Utc;
use thiserror::Error;

/// Errors from timestamp parsing and interval arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("malformed dirstamp {0:?}, expected YYYY-MM-DD_HHMMSS")]
    Parse(String),

    #[error("unknown interval {0:?}, expected one of minutely, hourly, daily, weekly, monthly, yearly")]
    UnknownInterval(String),

    #[error("interval offset must be at least 1, got {0}")]
    InvalidOffset(u32),

    #[error("time difference must not be negative, got {0}s")]
    NegativeDifference(i64),
}

/// Trait for getting the current time.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time truncated to whole seconds.
    fn now(&self) -> Dirstamp;
}

/// Real system clock implementation (UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Dirstamp {
        Dirstamp::from_naive(Utc::now().naive_utc())
    }
}

/// Mock clock for testing with a fixed time.
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    stamp: Dirstamp,
}

impl MockClock {
    /// Create a mock clock fixed at `stamp`.
    pub fn new(stamp: Dirstamp) -> Self {
        Self { stamp }
    }

    /// Create a mock clock from a `YYYY-MM-DD_HHMMSS` string.
    pub fn at(stamp: &str) -> Result<Self, TimeError> {
        Ok(Self::new(Dirstamp::parse(stamp)?))
    }
}

impl Clock for MockClock {
    fn now(&self) -> Dirstamp {
        self.stamp
    }
}
