use std::path::PathBuf;

use poppins_fs::ShellCommand;

use super::{snapshot_path, Backend, BackendContext, BackendKind};
use crate::bucket::RetentionBucket;
use crate::error::RotateError;
use crate::mapper::ArchiveLayout;
use crate::plan::ActionKind;
use crate::policy::RetentionPolicy;
use crate::safety::guard_removal_path;
use crate::snapshot::SnapshotName;

/// Snapshots as read-only Btrfs subvolumes. The sync directory must itself
/// be a subvolume.
pub struct BtrfsBackend<'a> {
    ctx: BackendContext<'a>,
    archive_root: PathBuf,
    sync_dir: PathBuf,
}

impl<'a> BtrfsBackend<'a> {
    pub fn new(ctx: BackendContext<'a>, archive_root: PathBuf, sync_dir: PathBuf) -> Self {
        Self {
            ctx,
            archive_root,
            sync_dir,
        }
    }
}

impl Backend for BtrfsBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Btrfs
    }

    fn layout(&mut self) -> Result<ArchiveLayout, RotateError> {
        Ok(ArchiveLayout::PerBucket {
            root: self.archive_root.clone(),
        })
    }

    // Bucket directories stay plain directories; only snapshots are subvolumes
    fn ensure_directories(&mut self, policy: &RetentionPolicy) -> Result<(), RotateError> {
        self.ctx.ensure_bucket_dirs(&self.archive_root, policy)
    }

    fn add(&self, bucket: &RetentionBucket, name: &SnapshotName) -> Result<(), RotateError> {
        let target = snapshot_path(&self.archive_root, bucket, name);
        let command = ShellCommand::new("btrfs")
            .arg("subvolume")
            .arg("snapshot")
            .arg("-r")
            .arg(self.sync_dir.to_string_lossy())
            .arg(target.to_string_lossy());
        self.ctx.run_primitive(&command, ActionKind::Add, bucket, name)?;
        Ok(())
    }

    fn remove(&self, bucket: &RetentionBucket, name: &SnapshotName) -> Result<(), RotateError> {
        let target = snapshot_path(&self.archive_root, bucket, name);
        guard_removal_path(&target)?;
        let command = ShellCommand::new("btrfs")
            .arg("subvolume")
            .arg("delete")
            .arg(target.to_string_lossy());
        self.ctx.run_primitive(&command, ActionKind::Remove, bucket, name)?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), RotateError> {
        Ok(())
    }
}
