use std::path::{Path, PathBuf};

use poppins_fs::ShellCommand;

use super::{Backend, BackendContext, BackendKind};
use crate::bucket::RetentionBucket;
use crate::error::RotateError;
use crate::mapper::ArchiveLayout;
use crate::plan::ActionKind;
use crate::policy::RetentionPolicy;
use crate::safety::guard_zfs_snapshot;
use crate::snapshot::SnapshotName;

/// Snapshot listing below a dataset's mountpoint.
pub const ZFS_SNAPSHOT_DIR: &str = ".zfs/snapshot";

/// Snapshots of a single ZFS dataset, partitioned into buckets by label.
///
/// The archive root becomes a symlink to `<mountpoint>/.zfs/snapshot` so the
/// snapshots appear where the other backends keep theirs.
pub struct ZfsBackend<'a> {
    ctx: BackendContext<'a>,
    archive_root: PathBuf,
    dataset: String,
    mountpoint: Option<PathBuf>,
}

impl<'a> ZfsBackend<'a> {
    pub fn new(
        ctx: BackendContext<'a>,
        archive_root: PathBuf,
        dataset: String,
        mountpoint: Option<PathBuf>,
    ) -> Self {
        Self {
            ctx,
            archive_root,
            dataset,
            mountpoint,
        }
    }

    fn target(&self, bucket: &RetentionBucket, name: &SnapshotName) -> String {
        format!("{}@{}", self.dataset, name.zfs_label(bucket))
    }

    /// Configured mountpoint, else the one reported by `zfs get`.
    fn mountpoint(&mut self) -> Result<PathBuf, RotateError> {
        if let Some(mountpoint) = &self.mountpoint {
            return Ok(mountpoint.clone());
        }
        let mountpoint = self.lookup_mountpoint()?;
        self.ctx.logger.debug(&format!(
            "dataset {} is mounted at {}",
            self.dataset,
            mountpoint.display()
        ));
        self.mountpoint = Some(mountpoint.clone());
        Ok(mountpoint)
    }

    fn lookup_mountpoint(&self) -> Result<PathBuf, RotateError> {
        let command = ShellCommand::new("zfs")
            .arg("get")
            .arg("-H")
            .arg("-o")
            .arg("value")
            .arg("mountpoint")
            .arg(&self.dataset);
        let output = self.ctx.run(&command)?;

        let lookup_error = |detail: String| RotateError::MountpointLookup {
            dataset: self.dataset.clone(),
            detail,
        };

        if !output.success() {
            let stderr = output.stderr.trim();
            return Err(lookup_error(if stderr.is_empty() {
                format!("zfs get exited with status {}", output.exit_status)
            } else {
                stderr.to_string()
            }));
        }

        // `none`, `legacy` and `-` mean there is no usable snapshot directory
        let value = output.stdout.trim();
        if !value.starts_with('/') {
            return Err(lookup_error(format!("unusable mountpoint {value:?}")));
        }
        Ok(PathBuf::from(value))
    }
}

impl Backend for ZfsBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Zfs
    }

    fn layout(&mut self) -> Result<ArchiveLayout, RotateError> {
        Ok(ArchiveLayout::Shared {
            dir: self.mountpoint()?.join(ZFS_SNAPSHOT_DIR),
        })
    }

    // Snapshots live inside the dataset; nothing to create up front
    fn ensure_directories(&mut self, _policy: &RetentionPolicy) -> Result<(), RotateError> {
        Ok(())
    }

    fn add(&self, bucket: &RetentionBucket, name: &SnapshotName) -> Result<(), RotateError> {
        let command = ShellCommand::new("zfs")
            .arg("snapshot")
            .arg(self.target(bucket, name));
        self.ctx.run_primitive(&command, ActionKind::Add, bucket, name)?;
        Ok(())
    }

    fn remove(&self, bucket: &RetentionBucket, name: &SnapshotName) -> Result<(), RotateError> {
        let target = self.target(bucket, name);
        guard_zfs_snapshot(&target)?;
        let command = ShellCommand::new("zfs").arg("destroy").arg(target);
        self.ctx.run_primitive(&command, ActionKind::Remove, bucket, name)?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), RotateError> {
        let snapshot_dir = self.mountpoint()?.join(ZFS_SNAPSHOT_DIR);
        let link: &Path = &self.archive_root;

        if self.ctx.fs.exists(link) {
            return Ok(());
        }
        if !self.ctx.fs.is_dir(&snapshot_dir) {
            self.ctx.logger.warn(&format!(
                "not linking {}: {} does not exist",
                link.display(),
                snapshot_dir.display()
            ));
            return Ok(());
        }

        self.ctx.logger.notice(&format!(
            "linking {} -> {}",
            link.display(),
            snapshot_dir.display()
        ));
        self.ctx.fs.symlink(&snapshot_dir, link)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MockLogger;
    use poppins_clock::{Dirstamp, Interval};
    use poppins_fs::{Filesystem, MockFilesystem, MockRunner};

    const ARCHIVE: &str = "/backups/web01/archive";

    fn name() -> SnapshotName {
        SnapshotName::new("web01", Dirstamp::parse("2015-06-07_170100").unwrap())
    }

    fn daily() -> RetentionBucket {
        RetentionBucket::Periodic {
            offset: 1,
            interval: Interval::Daily,
        }
    }

    fn backend<'a>(
        fs: &'a MockFilesystem,
        runner: &'a MockRunner,
        logger: &'a MockLogger,
        dataset: &str,
        mountpoint: Option<&str>,
    ) -> ZfsBackend<'a> {
        let ctx = BackendContext { fs, runner, logger };
        ZfsBackend::new(ctx, ARCHIVE.into(), dataset.to_string(), mountpoint.map(PathBuf::from))
    }

    // ===========================================
    // Primitives
    // ===========================================

    #[test]
    fn test_add_snapshots_dataset_with_bucket_label() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        let zfs = backend(&fs, &runner, &logger, "tank/web01", Some("/backups/web01"));

        zfs.add(&daily(), &name()).expect("add");

        assert_eq!(
            runner.rendered(),
            vec!["zfs snapshot tank/web01@1-daily-web01.2015-06-07_170100.poppins"]
        );
    }

    #[test]
    fn test_remove_destroys_labelled_snapshot() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        let zfs = backend(&fs, &runner, &logger, "tank/web01", Some("/backups/web01"));

        zfs.remove(&RetentionBucket::Incremental, &name()).expect("remove");

        assert_eq!(
            runner.rendered(),
            vec!["zfs destroy tank/web01@incremental-web01.2015-06-07_170100.poppins"]
        );
    }

    #[test]
    fn test_remove_refuses_blank_dataset() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        let zfs = backend(&fs, &runner, &logger, " ", Some("/backups/web01"));

        let err = zfs.remove(&daily(), &name()).unwrap_err();

        assert!(matches!(err, RotateError::UnsafeRemovalTarget(_)));
        assert!(runner.executed().is_empty());
    }

    #[test]
    fn test_remove_failure_is_backend_error() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        runner.fail_when("zfs destroy", 1);
        let zfs = backend(&fs, &runner, &logger, "tank/web01", Some("/backups/web01"));

        let err = zfs.remove(&daily(), &name()).unwrap_err();
        assert!(matches!(err, RotateError::BackendCommand { exit_status: 1, .. }));
    }

    // ===========================================
    // Mountpoint
    // ===========================================

    #[test]
    fn test_layout_uses_configured_mountpoint() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        let mut zfs = backend(&fs, &runner, &logger, "tank/web01", Some("/backups/web01"));

        assert_eq!(
            zfs.layout().expect("layout"),
            ArchiveLayout::Shared {
                dir: "/backups/web01/.zfs/snapshot".into()
            }
        );
        assert!(runner.executed().is_empty());
    }

    #[test]
    fn test_layout_looks_up_mountpoint_once() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        runner.stdout_when("zfs get", "/tank/web01\n");
        let mut zfs = backend(&fs, &runner, &logger, "tank/web01", None);

        let first = zfs.layout().expect("first");
        let second = zfs.layout().expect("second");

        assert_eq!(first, ArchiveLayout::Shared { dir: "/tank/web01/.zfs/snapshot".into() });
        assert_eq!(first, second);
        assert_eq!(
            runner.rendered(),
            vec!["zfs get -H -o value mountpoint tank/web01"]
        );
    }

    #[test]
    fn test_mountpoint_lookup_failure() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        runner.respond(
            "zfs get",
            poppins_fs::CommandOutput {
                stdout: String::new(),
                stderr: "cannot open 'tank/nope': dataset does not exist\n".to_string(),
                exit_status: 1,
            },
        );
        let mut zfs = backend(&fs, &runner, &logger, "tank/nope", None);

        match zfs.layout().unwrap_err() {
            RotateError::MountpointLookup { dataset, detail } => {
                assert_eq!(dataset, "tank/nope");
                assert!(detail.contains("does not exist"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_mountpoint_legacy_is_unusable() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        runner.stdout_when("zfs get", "legacy\n");
        let mut zfs = backend(&fs, &runner, &logger, "tank/web01", None);

        assert!(matches!(zfs.layout(), Err(RotateError::MountpointLookup { .. })));
    }

    // ===========================================
    // Finalize
    // ===========================================

    #[test]
    fn test_finalize_links_archive_to_snapshot_dir() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        fs.add_dir("/backups/web01/.zfs/snapshot");
        let mut zfs = backend(&fs, &runner, &logger, "tank/web01", Some("/backups/web01"));

        zfs.finalize().expect("finalize");

        assert_eq!(
            fs.symlink_target(Path::new(ARCHIVE)),
            Some(PathBuf::from("/backups/web01/.zfs/snapshot"))
        );
        assert!(fs.is_dir(Path::new(ARCHIVE)));
    }

    #[test]
    fn test_finalize_keeps_existing_link() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        fs.add_dir("/backups/web01/.zfs/snapshot");
        fs.add_dir(ARCHIVE);
        let mut zfs = backend(&fs, &runner, &logger, "tank/web01", Some("/backups/web01"));

        zfs.finalize().expect("finalize");
        zfs.finalize().expect("finalize again");

        assert_eq!(fs.symlink_target(Path::new(ARCHIVE)), None);
        assert_eq!(logger.count(), 0);
    }

    #[test]
    fn test_finalize_skips_missing_snapshot_dir() {
        let (fs, runner, logger) = (MockFilesystem::new(), MockRunner::new(), MockLogger::new());
        let mut zfs = backend(&fs, &runner, &logger, "tank/web01", Some("/backups/web01"));

        zfs.finalize().expect("finalize");

        assert!(!fs.exists(Path::new(ARCHIVE)));
        assert!(logger.contains("does not exist"));
    }
}
