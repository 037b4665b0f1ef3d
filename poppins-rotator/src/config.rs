//! Resolved rotation settings.

use std::path::PathBuf;

use crate::backend::BackendKind;
use crate::error::PolicyError;
use crate::policy::RetentionPolicy;

/// Backend selection with the settings only that backend needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Default,
    Btrfs,
    Zfs {
        dataset: String,
        /// Looked up with `zfs get` when absent.
        mountpoint: Option<PathBuf>,
    },
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Default => BackendKind::Default,
            BackendConfig::Btrfs => BackendKind::Btrfs,
            BackendConfig::Zfs { .. } => BackendKind::Zfs,
        }
    }
}

/// Everything one rotation run of one host needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatorConfig {
    /// `<host root>/archive`
    pub archive_root: PathBuf,
    /// `<host root>/files`, the live copy snapshots are taken from.
    pub sync_dir: PathBuf,
    pub hostdir_name: String,
    pub policy: RetentionPolicy,
    pub backend: BackendConfig,
}

impl RotatorConfig {
    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let hostdir = self.hostdir_name.trim();
        if hostdir.is_empty()
            || hostdir.contains('/')
            || hostdir == "."
            || hostdir == ".."
            || hostdir != self.hostdir_name
        {
            return Err(PolicyError::InvalidHostdir(self.hostdir_name.clone()));
        }
        if self.policy.is_empty() {
            return Err(PolicyError::Empty);
        }
        Ok(())
    }
}
