//! Storage backends.
//!
//! A backend knows how one storage mechanism lays out its snapshots and how
//! to create and delete them. The rotation logic itself never branches on
//! the backend; it only talks to the [`Backend`] trait.

mod btrfs;
mod default;
mod zfs;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use poppins_fs::{CommandOutput, CommandRunner, Filesystem, ShellCommand};
use serde::Serialize;

use crate::bucket::RetentionBucket;
use crate::config::{BackendConfig, RotatorConfig};
use crate::error::RotateError;
use crate::logger::Logger;
use crate::mapper::ArchiveLayout;
use crate::plan::ActionKind;
use crate::policy::RetentionPolicy;
use crate::snapshot::SnapshotName;

pub use btrfs::BtrfsBackend;
pub use default::DefaultBackend;
pub use zfs::{ZfsBackend, ZFS_SNAPSHOT_DIR};

/// Names of the supported snapshot mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hardlink copies made with `cp -al`.
    Default,
    Btrfs,
    Zfs,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Default, BackendKind::Btrfs, BackendKind::Zfs];

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Default => "default",
            BackendKind::Btrfs => "btrfs",
            BackendKind::Zfs => "zfs",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown snapshot backend {s:?}, expected default, btrfs or zfs"))
    }
}

/// One storage mechanism's snapshot primitives.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Where the mapper finds this backend's snapshots.
    fn layout(&mut self) -> Result<ArchiveLayout, RotateError>;

    /// Create whatever must exist before snapshots can be added.
    fn ensure_directories(&mut self, policy: &RetentionPolicy) -> Result<(), RotateError>;

    /// Materialize snapshot `name` in `bucket`.
    fn add(&self, bucket: &RetentionBucket, name: &SnapshotName) -> Result<(), RotateError>;

    /// Delete snapshot `name` from `bucket`.
    fn remove(&self, bucket: &RetentionBucket, name: &SnapshotName) -> Result<(), RotateError>;

    /// Post-processing after all mutations were applied.
    fn finalize(&mut self) -> Result<(), RotateError>;
}

/// Collaborators every backend shares.
#[derive(Clone, Copy)]
pub struct BackendContext<'a> {
    pub fs: &'a dyn Filesystem,
    pub runner: &'a dyn CommandRunner,
    pub logger: &'a dyn Logger,
}

impl BackendContext<'_> {
    /// Run one snapshot primitive. A non-zero exit aborts the run.
    pub fn run_primitive(
        &self,
        command: &ShellCommand,
        action: ActionKind,
        bucket: &RetentionBucket,
        name: &SnapshotName,
    ) -> Result<CommandOutput, RotateError> {
        let output = self.run(command)?;
        if !output.success() {
            return Err(RotateError::BackendCommand {
                bucket: *bucket,
                name: name.to_string(),
                action,
                exit_status: output.exit_status,
            });
        }
        Ok(output)
    }

    /// Run a command and log it, leaving the exit status to the caller.
    pub fn run(&self, command: &ShellCommand) -> Result<CommandOutput, RotateError> {
        self.logger.verbose(&format!("running: {}", command));
        let output = self.runner.execute(command)?;
        for line in output.stdout.lines().chain(output.stderr.lines()) {
            self.logger.debug(&format!("  {}", line));
        }
        if !output.success() {
            self.logger.debug(&format!("  exit status {}", output.exit_status));
        }
        Ok(output)
    }

    /// Create `root` and one directory per bucket under it.
    fn ensure_bucket_dirs(&self, root: &Path, policy: &RetentionPolicy) -> Result<(), RotateError> {
        for dir in std::iter::once(root.to_path_buf()).chain(bucket_dirs(root, policy)) {
            if !self.fs.is_dir(&dir) {
                self.logger.notice(&format!("creating {}", dir.display()));
                self.fs.create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}

fn bucket_dirs<'p>(root: &'p Path, policy: &'p RetentionPolicy) -> impl Iterator<Item = PathBuf> + 'p {
    policy.buckets().map(move |bucket| root.join(bucket.to_string()))
}

/// Path of snapshot `name` in a per-bucket archive.
pub fn snapshot_path(root: &Path, bucket: &RetentionBucket, name: &SnapshotName) -> PathBuf {
    root.join(bucket.to_string()).join(name.to_string())
}

/// Select the backend named by `config`.
pub fn create_backend<'a>(
    config: &RotatorConfig,
    ctx: BackendContext<'a>,
) -> Box<dyn Backend + 'a> {
    match &config.backend {
        BackendConfig::Default => Box::new(DefaultBackend::new(
            ctx,
            config.archive_root.clone(),
            config.sync_dir.clone(),
        )),
        BackendConfig::Btrfs => Box::new(BtrfsBackend::new(
            ctx,
            config.archive_root.clone(),
            config.sync_dir.clone(),
        )),
        BackendConfig::Zfs {
            dataset,
            mountpoint,
        } => Box::new(ZfsBackend::new(
            ctx,
            config.archive_root.clone(),
            dataset.clone(),
            mountpoint.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MockLogger;
    use poppins_clock::{Dirstamp, Interval};
    use poppins_fs::{MockFilesystem, MockRunner};

    fn config(backend: BackendConfig) -> RotatorConfig {
        RotatorConfig {
            archive_root: PathBuf::from("/backups/web01/archive"),
            sync_dir: PathBuf::from("/backups/web01/files"),
            hostdir_name: "web01".to_string(),
            policy: RetentionPolicy::new().with(RetentionBucket::Incremental, 3),
            backend,
        }
    }

    fn name() -> SnapshotName {
        SnapshotName::new("web01", Dirstamp::parse("2015-06-07_170100").unwrap())
    }

    // ===========================================
    // BackendKind
    // ===========================================

    #[test]
    fn test_backend_kind_round_trip() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.to_string().parse::<BackendKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_backend_kind_unknown() {
        let err = "ext4".parse::<BackendKind>().unwrap_err();
        assert!(err.contains("ext4"));
    }

    #[test]
    fn test_backend_kind_is_case_sensitive() {
        assert!("ZFS".parse::<BackendKind>().is_err());
    }

    // ===========================================
    // Factory
    // ===========================================

    #[test]
    fn test_create_backend_selects_kind() {
        let fs = MockFilesystem::new();
        let runner = MockRunner::new();
        let logger = MockLogger::new();
        let ctx = BackendContext {
            fs: &fs,
            runner: &runner,
            logger: &logger,
        };

        let zfs = BackendConfig::Zfs {
            dataset: "tank/web01".to_string(),
            mountpoint: Some(PathBuf::from("/backups/web01")),
        };
        for (backend, kind) in [
            (BackendConfig::Default, BackendKind::Default),
            (BackendConfig::Btrfs, BackendKind::Btrfs),
            (zfs, BackendKind::Zfs),
        ] {
            assert_eq!(create_backend(&config(backend), ctx).kind(), kind);
        }
    }

    // ===========================================
    // Primitives
    // ===========================================

    #[test]
    fn test_run_primitive_maps_exit_status() {
        let fs = MockFilesystem::new();
        let runner = MockRunner::new();
        runner.fail_when("cp -al", 2);
        let logger = MockLogger::new();
        let ctx = BackendContext {
            fs: &fs,
            runner: &runner,
            logger: &logger,
        };
        let bucket = RetentionBucket::Periodic {
            offset: 1,
            interval: Interval::Daily,
        };

        let err = ctx
            .run_primitive(
                &ShellCommand::new("cp").arg("-al").arg("a").arg("b"),
                ActionKind::Add,
                &bucket,
                &name(),
            )
            .unwrap_err();

        match err {
            RotateError::BackendCommand {
                bucket: failed,
                name,
                action,
                exit_status,
            } => {
                assert_eq!(failed, bucket);
                assert_eq!(name, "web01.2015-06-07_170100.poppins");
                assert_eq!(action, ActionKind::Add);
                assert_eq!(exit_status, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_run_logs_command_at_verbose() {
        let fs = MockFilesystem::new();
        let runner = MockRunner::new();
        runner.stdout_when("zfs get", "/backups/web01\n");
        let logger = MockLogger::new();
        let ctx = BackendContext {
            fs: &fs,
            runner: &runner,
            logger: &logger,
        };

        ctx.run(&ShellCommand::new("zfs").arg("get").arg("mountpoint"))
            .expect("run");

        assert_eq!(
            logger.messages_at_level(crate::logger::Level::Verbose),
            vec!["running: zfs get mountpoint"]
        );
        assert!(logger.contains("/backups/web01"));
    }

    #[test]
    fn test_ensure_bucket_dirs_creates_missing() {
        let fs = MockFilesystem::new();
        fs.add_dir("/backups/web01/archive/incremental");
        let runner = MockRunner::new();
        let logger = MockLogger::new();
        let ctx = BackendContext {
            fs: &fs,
            runner: &runner,
            logger: &logger,
        };
        let policy = RetentionPolicy::new()
            .with(RetentionBucket::Incremental, 3)
            .with(
                RetentionBucket::Periodic {
                    offset: 1,
                    interval: Interval::Daily,
                },
                2,
            );

        ctx.ensure_bucket_dirs(Path::new("/backups/web01/archive"), &policy)
            .expect("ensure");

        assert!(fs.is_dir(Path::new("/backups/web01/archive/1-daily")));
        assert_eq!(logger.count(), 1);
    }

    #[test]
    fn test_snapshot_path() {
        assert_eq!(
            snapshot_path(Path::new("/a"), &RetentionBucket::Incremental, &name()),
            PathBuf::from("/a/incremental/web01.2015-06-07_170100.poppins")
        );
    }
}
