//! Time-bucketed snapshot rotation.
//!
//! Each configured retention bucket (`incremental`, `1-hourly`, `1-daily`,
//! ...) keeps at most its configured number of snapshots. A run maps what
//! is on disk, decides per bucket whether a fresh snapshot is admitted,
//! trims every bucket to its retention count and applies the difference
//! through one of three storage backends (hardlink copies, Btrfs
//! subvolumes or ZFS snapshots).

pub mod backend;
pub mod bucket;
pub mod config;
pub mod error;
pub mod logger;
pub mod mapper;
pub mod plan;
pub mod policy;
pub mod report;
pub mod rotator;
pub mod safety;
pub mod snapshot;

pub use backend::{create_backend, Backend, BackendContext, BackendKind};
pub use bucket::RetentionBucket;
pub use config::{BackendConfig, RotatorConfig};
pub use error::{PolicyError, RotateError};
pub use logger::{Level, LogEntry, Logger, MockLogger, NullLogger, StderrLogger, Verbosity};
pub use mapper::{ArchiveLayout, ArchiveMapper, ArchiveScan, ArchiveState, UncleanEntry};
pub use plan::{Action, ActionKind, BucketPlan, Plan};
pub use policy::RetentionPolicy;
pub use report::{BucketReport, Report};
pub use rotator::Rotator;
pub use snapshot::{NamePattern, SnapshotName};
