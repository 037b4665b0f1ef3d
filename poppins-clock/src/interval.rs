//! Retention intervals and the elapsed-time test.
//!
//! Durations are fixed approximations: a month is 30 days and a year is
//! 365 days. There is no calendar or DST awareness.

use std::fmt;
use std::str::FromStr;

use crate::TimeError;

/// Unit of a periodic retention bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interval {
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Interval {
    /// All recognized intervals, shortest first.
    pub const ALL: [Interval; 6] = [
        Interval::Minutely,
        Interval::Hourly,
        Interval::Daily,
        Interval::Weekly,
        Interval::Monthly,
        Interval::Yearly,
    ];

    /// Configuration name of the interval.
    pub fn name(&self) -> &'static str {
        match self {
            Interval::Minutely => "minutely",
            Interval::Hourly => "hourly",
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::Yearly => "yearly",
        }
    }

    /// Seconds in one unit of this interval.
    pub fn seconds_per_unit(&self) -> i64 {
        match self {
            Interval::Minutely => 60,
            Interval::Hourly => 3_600,
            Interval::Daily => 86_400,
            Interval::Weekly => 604_800,
            Interval::Monthly => 2_592_000,
            Interval::Yearly => 31_536_000,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Interval {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|interval| interval.name() == s)
            .ok_or_else(|| TimeError::UnknownInterval(s.to_string()))
    }
}

/// Threshold in seconds for `offset` units of `interval`.
pub fn threshold_secs(offset: u32, interval: Interval) -> Result<i64, TimeError> {
    if offset == 0 {
        return Err(TimeError::InvalidOffset(offset));
    }
    Ok(i64::from(offset) * interval.seconds_per_unit())
}

/// Whether `diff_secs` reaches `offset` units of `interval`.
///
/// The boundary is inclusive: a difference exactly equal to the threshold
/// exceeds it.
pub fn exceeds(diff_secs: i64, offset: u32, interval: Interval) -> Result<bool, TimeError> {
    if diff_secs < 0 {
        return Err(TimeError::NegativeDifference(diff_secs));
    }
    Ok(diff_secs >= threshold_secs(offset, interval)?)
}
