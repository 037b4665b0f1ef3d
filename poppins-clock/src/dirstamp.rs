//! Dirstamp codec.
//!
//! A dirstamp is the `YYYY-MM-DD_HHMMSS` timestamp embedded in every snapshot
//! name. The format is zero-padded, so lexicographic order of the string form
//! equals chronological order.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};

use crate::TimeError;

/// strftime format of a dirstamp.
pub const DIRSTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// A naive (timezone-free) moment with whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dirstamp(NaiveDateTime);

impl Dirstamp {
    /// Wrap a naive date-time, dropping sub-second precision.
    pub fn from_naive(moment: NaiveDateTime) -> Self {
        Self(moment.with_nanosecond(0).unwrap_or(moment))
    }

    /// Parse a `YYYY-MM-DD_HHMMSS` string.
    ///
    /// The time part is re-punctuated as `HH:MM:SS` and parsed as a regular
    /// date-time, so impossible calendar moments (month 13, hour 25) fail too.
    pub fn parse(stamp: &str) -> Result<Self, TimeError> {
        let err = || TimeError::Parse(stamp.to_string());

        let (date, time) = stamp.split_once('_').ok_or_else(err)?;
        if !has_date_shape(date) || time.len() != 6 || !time.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let time = format!("{}:{}:{}", &time[0..2], &time[2..4], &time[4..6]);
        NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M:%S")
            .map(Self)
            .map_err(|_| err())
    }

    /// Whole seconds elapsed from `earlier` to `self`; negative if `earlier` is later.
    pub fn seconds_since(&self, earlier: &Dirstamp) -> i64 {
        (self.0 - earlier.0).num_seconds()
    }

    /// The underlying naive date-time.
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for Dirstamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DIRSTAMP_FORMAT))
    }
}

impl std::str::FromStr for Dirstamp {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `dddd-dd-dd`
fn has_date_shape(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
