//! Snapshot names.
//!
//! On disk a snapshot is `<hostdir-name>.<YYYY-MM-DD_HHMMSS>.poppins`. ZFS
//! has no per-bucket directories, so its snapshot labels carry the bucket
//! key in front: `<bucket>-<hostdir-name>.<stamp>.poppins`.

use std::fmt;

use poppins_clock::{Dirstamp, TimeError};
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::bucket::RetentionBucket;

/// Extension shared by every snapshot name.
pub const SNAPSHOT_SUFFIX: &str = "poppins";

/// Name of one snapshot. Orders by embedded dirstamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotName {
    // Field order matters: the derived Ord compares the stamp first.
    stamp: String,
    hostdir: String,
}

impl SnapshotName {
    /// Name for a snapshot of `hostdir` taken at `stamp`.
    pub fn new(hostdir: &str, stamp: Dirstamp) -> Self {
        Self {
            stamp: stamp.to_string(),
            hostdir: hostdir.to_string(),
        }
    }

    /// The dirstamp substring as found on disk.
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn hostdir(&self) -> &str {
        &self.hostdir
    }

    /// Parse the embedded dirstamp into a real moment.
    pub fn dirstamp(&self) -> Result<Dirstamp, TimeError> {
        Dirstamp::parse(&self.stamp)
    }

    /// Label used for the ZFS snapshot of this name in `bucket`.
    pub fn zfs_label(&self, bucket: &RetentionBucket) -> String {
        format!("{}-{}", bucket, self)
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.hostdir, self.stamp, SNAPSHOT_SUFFIX)
    }
}

impl Serialize for SnapshotName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Recognizes snapshot names of one host directory.
#[derive(Debug, Clone)]
pub struct NamePattern {
    hostdir: String,
    regex: Regex,
}

impl NamePattern {
    pub fn new(hostdir: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(
            r"^{}\.([0-9]{{4}}-[0-9]{{2}}-[0-9]{{2}}_[0-9]{{6}})\.{}$",
            regex::escape(hostdir),
            SNAPSHOT_SUFFIX
        ))?;
        Ok(Self {
            hostdir: hostdir.to_string(),
            regex,
        })
    }

    /// Match a plain snapshot entry name.
    ///
    /// Only the shape of the dirstamp is checked here; whether it is a real
    /// calendar moment is decided by [`SnapshotName::dirstamp`].
    pub fn parse(&self, entry: &str) -> Option<SnapshotName> {
        let captures = self.regex.captures(entry)?;
        Some(SnapshotName {
            stamp: captures[1].to_string(),
            hostdir: self.hostdir.clone(),
        })
    }

    /// Match a ZFS label belonging to `bucket`.
    ///
    /// The bucket key must be followed by `-` and a complete snapshot name,
    /// so `1-daily` never claims `10-daily-…` labels.
    pub fn parse_label(&self, bucket: &RetentionBucket, entry: &str) -> Option<SnapshotName> {
        let prefix = format!("{}-", bucket);
        entry.strip_prefix(&prefix).and_then(|rest| self.parse(rest))
    }
}
