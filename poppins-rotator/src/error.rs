//! Error types for the rotation engine.

use poppins_clock::TimeError;
use poppins_fs::{CommandError, FsError};
use thiserror::Error;

use crate::bucket::RetentionBucket;
use crate::plan::ActionKind;

/// Errors in retention policy and naming configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("malformed retention bucket {0:?}, expected `incremental` or `<offset>-<interval>`")]
    MalformedBucket(String),

    #[error("retention bucket {key:?}: {source}")]
    Interval {
        key: String,
        #[source]
        source: TimeError,
    },

    #[error("retention count for {bucket} must be a non-negative integer, got {count}")]
    InvalidCount { bucket: String, count: i64 },

    #[error("retention bucket {0} is configured more than once")]
    DuplicateBucket(String),

    #[error("no retention buckets configured")]
    Empty,

    #[error("invalid host directory name {0:?}")]
    InvalidHostdir(String),
}

/// Errors from a rotation run. All of them abort the run.
#[derive(Debug, Error)]
pub enum RotateError {
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("snapshot {name} in {bucket} has a malformed dirstamp")]
    TimestampFormat {
        bucket: RetentionBucket,
        name: String,
    },

    #[error("newest snapshot in {bucket} is dated {newest}, later than now ({now})")]
    ClockOrdering {
        bucket: RetentionBucket,
        newest: String,
        now: String,
    },

    #[error("{action} of {name} in {bucket} failed with exit status {exit_status}")]
    BackendCommand {
        bucket: RetentionBucket,
        name: String,
        action: ActionKind,
        exit_status: i32,
    },

    #[error("cannot resolve mountpoint of dataset {dataset}: {detail}")]
    MountpointLookup { dataset: String, detail: String },

    #[error("refusing to remove unsafe target {0:?}")]
    UnsafeRemovalTarget(String),

    #[error("time error: {0}")]
    Time(#[from] TimeError),

    #[error("command error: {0}")]
    Command(#[from] CommandError),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),

    #[error("invalid snapshot name pattern: {0}")]
    Pattern(#[from] regex::Error),
}
