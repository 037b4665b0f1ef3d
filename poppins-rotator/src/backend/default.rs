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

/// Snapshots as hardlink copies of the sync directory.
pub struct DefaultBackend<'a> {
    ctx: BackendContext<'a>,
    archive_root: PathBuf,
    sync_dir: PathBuf,
}

impl<'a> DefaultBackend<'a> {
    pub fn new(ctx: BackendContext<'a>, archive_root: PathBuf, sync_dir: PathBuf) -> Self {
        Self {
            ctx,
            archive_root,
            sync_dir,
        }
    }
}

impl Backend for DefaultBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Default
    }

    fn layout(&mut self) -> Result<ArchiveLayout, RotateError> {
        Ok(ArchiveLayout::PerBucket {
            root: self.archive_root.clone(),
        })
    }

    fn ensure_directories(&mut self, policy: &RetentionPolicy) -> Result<(), RotateError> {
        self.ctx.ensure_bucket_dirs(&self.archive_root, policy)
    }

    fn add(&self, bucket: &RetentionBucket, name: &SnapshotName) -> Result<(), RotateError> {
        let target = snapshot_path(&self.archive_root, bucket, name);
        let command = ShellCommand::new("cp")
            .arg("-al")
            .arg(self.sync_dir.to_string_lossy())
            .arg(target.to_string_lossy());
        self.ctx.run_primitive(&command, ActionKind::Add, bucket, name)?;
        Ok(())
    }

    fn remove(&self, bucket: &RetentionBucket, name: &SnapshotName) -> Result<(), RotateError> {
        let target = snapshot_path(&self.archive_root, bucket, name);
        guard_removal_path(&target)?;
        let command = ShellCommand::new("rm").arg("-rf").arg(target.to_string_lossy());
        self.ctx.run_primitive(&command, ActionKind::Remove, bucket, name)?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), RotateError> {
        Ok(())
    }
}
