//! Check command: show what a configuration resolves to.

use std::fmt;
use std::path::{Path, PathBuf};

use poppins_rotator::{BackendConfig, RetentionBucket, RotatorConfig};

/// Resolved view of a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    pub config_path: PathBuf,
    pub hostdir_name: String,
    pub archive_root: PathBuf,
    pub sync_dir: PathBuf,
    pub backend: String,
    /// `(bucket, retain, threshold seconds)`; no threshold for incremental.
    pub buckets: Vec<(RetentionBucket, usize, Option<i64>)>,
}

/// Execute the check command. Loading already validated the configuration.
pub fn execute_check(config_path: &Path, config: &RotatorConfig) -> CheckSummary {
    let backend = match &config.backend {
        BackendConfig::Zfs {
            dataset,
            mountpoint: Some(mountpoint),
        } => format!("zfs (dataset {}, mountpoint {})", dataset, mountpoint.display()),
        BackendConfig::Zfs {
            dataset,
            mountpoint: None,
        } => format!("zfs (dataset {}, mountpoint from zfs get)", dataset),
        other => other.kind().to_string(),
    };

    CheckSummary {
        config_path: config_path.to_path_buf(),
        hostdir_name: config.hostdir_name.clone(),
        archive_root: config.archive_root.clone(),
        sync_dir: config.sync_dir.clone(),
        backend,
        buckets: config
            .policy
            .iter()
            .map(|(bucket, retain)| (*bucket, retain, bucket.threshold_secs()))
            .collect(),
    }
}

impl fmt::Display for CheckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "config {} is valid", self.config_path.display())?;
        writeln!(f, "host directory: {}", self.hostdir_name)?;
        writeln!(f, "archive root: {}", self.archive_root.display())?;
        writeln!(f, "sync directory: {}", self.sync_dir.display())?;
        writeln!(f, "backend: {}", self.backend)?;
        writeln!(f, "retention:")?;
        for (bucket, retain, threshold) in &self.buckets {
            match threshold {
                Some(secs) => writeln!(f, "  {:<14} keep {:<4} every {}s", bucket.to_string(), retain, secs)?,
                None => writeln!(f, "  {:<14} keep {:<4} every run", bucket.to_string(), retain)?,
            }
        }
        Ok(())
    }
}
