//! Retention buckets.
//!
//! A bucket is either `incremental` (a new snapshot every run) or
//! `<offset>-<interval>` such as `2-hourly` (a new snapshot once the newest
//! one is at least two hours old).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use poppins_clock::{exceeds, threshold_secs, Interval, TimeError};
use serde::{Serialize, Serializer};

use crate::error::PolicyError;

/// Key of the incremental bucket.
pub const INCREMENTAL: &str = "incremental";

/// A named retention category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetentionBucket {
    Incremental,
    Periodic { offset: u32, interval: Interval },
}

impl RetentionBucket {
    /// Parse a bucket key.
    ///
    /// Offsets are plain decimal without sign or leading zeros, so every
    /// bucket has exactly one key and one directory name.
    pub fn parse(key: &str) -> Result<Self, PolicyError> {
        if key == INCREMENTAL {
            return Ok(RetentionBucket::Incremental);
        }

        let malformed = || PolicyError::MalformedBucket(key.to_string());
        let (offset, interval) = key.split_once('-').ok_or_else(malformed)?;

        if offset.is_empty()
            || !offset.bytes().all(|b| b.is_ascii_digit())
            || (offset.len() > 1 && offset.starts_with('0'))
        {
            return Err(malformed());
        }

        let with_key = |source: TimeError| PolicyError::Interval {
            key: key.to_string(),
            source,
        };
        let offset: u32 = offset.parse().map_err(|_| malformed())?;
        let interval: Interval = interval.parse().map_err(with_key)?;
        threshold_secs(offset, interval).map_err(with_key)?;

        Ok(RetentionBucket::Periodic { offset, interval })
    }

    pub fn is_incremental(&self) -> bool {
        matches!(self, RetentionBucket::Incremental)
    }

    /// Admission threshold in seconds; `None` for the incremental bucket.
    pub fn threshold_secs(&self) -> Option<i64> {
        match self {
            RetentionBucket::Incremental => None,
            RetentionBucket::Periodic { offset, interval } => {
                threshold_secs(*offset, *interval).ok()
            }
        }
    }

    /// Whether `diff_secs` since the newest snapshot warrants a new one.
    ///
    /// Always true for the incremental bucket.
    pub fn exceeds(&self, diff_secs: i64) -> Result<bool, TimeError> {
        match self {
            RetentionBucket::Incremental => Ok(true),
            RetentionBucket::Periodic { offset, interval } => exceeds(diff_secs, *offset, *interval),
        }
    }

    fn sort_key(&self) -> (i64, Option<Interval>, u32) {
        match self {
            RetentionBucket::Incremental => (-1, None, 0),
            RetentionBucket::Periodic { offset, interval } => (
                i64::from(*offset) * interval.seconds_per_unit(),
                Some(*interval),
                *offset,
            ),
        }
    }
}

/// Incremental first, then ascending threshold.
impl Ord for RetentionBucket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for RetentionBucket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RetentionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionBucket::Incremental => f.write_str(INCREMENTAL),
            RetentionBucket::Periodic { offset, interval } => write!(f, "{}-{}", offset, interval),
        }
    }
}

impl FromStr for RetentionBucket {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RetentionBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
