//! Host configuration file.
//!
//! ```toml
//! [local]
//! rootdir = "/backups"
//! hostdir-name = "web01"
//! snapshot-backend = "default"   # default | btrfs | zfs
//! zfs-dataset = "tank/web01"     # zfs only
//! zfs-mountpoint = "/backups/web01"
//!
//! [snapshots]
//! incremental = 6
//! "1-daily" = 7
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use poppins_fs::{Filesystem, FsError};
use poppins_rotator::{BackendConfig, BackendKind, PolicyError, RetentionPolicy, RotatorConfig};
use serde::Deserialize;
use thiserror::Error;

/// Archive directory below the host root.
pub const ARCHIVE_DIR: &str = "archive";

/// Live sync directory below the host root.
pub const SYNC_DIR: &str = "files";

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] FsError),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("rootdir must be an absolute path, got {0:?}")]
    RelativeRootdir(PathBuf),

    #[error("zfs-mountpoint must be an absolute path, got {0:?}")]
    RelativeMountpoint(PathBuf),

    #[error("{0}")]
    Backend(String),

    #[error("snapshot-backend zfs requires zfs-dataset")]
    MissingDataset,

    #[error("{0}")]
    Policy(#[from] PolicyError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    local: LocalSection,
    snapshots: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct LocalSection {
    rootdir: PathBuf,
    hostdir_name: String,
    #[serde(default)]
    snapshot_backend: Option<String>,
    #[serde(default)]
    zfs_dataset: Option<String>,
    #[serde(default)]
    zfs_mountpoint: Option<PathBuf>,
}

/// Load and validate the configuration file at `path`.
pub fn load_config<F: Filesystem>(fs: &F, path: &Path) -> Result<RotatorConfig, ConfigError> {
    let content = fs.read_file(path)?;
    parse_config(&content)
}

/// Parse and validate configuration content.
pub fn parse_config(content: &str) -> Result<RotatorConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(content)?;
    let local = file.local;

    if !local.rootdir.is_absolute() {
        return Err(ConfigError::RelativeRootdir(local.rootdir));
    }

    let backend = parse_backend(&local)?;
    let policy = RetentionPolicy::from_entries(file.snapshots)?;

    let host_root = local.rootdir.join(&local.hostdir_name);
    let config = RotatorConfig {
        archive_root: host_root.join(ARCHIVE_DIR),
        sync_dir: host_root.join(SYNC_DIR),
        hostdir_name: local.hostdir_name,
        policy,
        backend,
    };
    config.validate()?;
    Ok(config)
}

fn parse_backend(local: &LocalSection) -> Result<BackendConfig, ConfigError> {
    let kind = match &local.snapshot_backend {
        Some(name) => name.parse::<BackendKind>().map_err(ConfigError::Backend)?,
        None => BackendKind::Default,
    };

    Ok(match kind {
        BackendKind::Default => BackendConfig::Default,
        BackendKind::Btrfs => BackendConfig::Btrfs,
        BackendKind::Zfs => {
            let dataset = local
                .zfs_dataset
                .as_deref()
                .map(str::trim)
                .filter(|dataset| !dataset.is_empty())
                .ok_or(ConfigError::MissingDataset)?;
            if let Some(mountpoint) = local.zfs_mountpoint.as_ref().filter(|m| !m.is_absolute()) {
                return Err(ConfigError::RelativeMountpoint(mountpoint.clone()));
            }
            BackendConfig::Zfs {
                dataset: dataset.to_string(),
                mountpoint: local.zfs_mountpoint.clone(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use poppins_clock::Interval;
    use poppins_fs::MockFilesystem;
    use poppins_rotator::RetentionBucket;

    const MINIMAL: &str = r#"
[local]
rootdir = "/backups"
hostdir-name = "web01"

[snapshots]
incremental = 6
"1-daily" = 7
"#;

    fn with_local(extra: &str) -> String {
        format!(
            "[local]\nrootdir = \"/backups\"\nhostdir-name = \"web01\"\n{extra}\n\n[snapshots]\nincremental = 3\n"
        )
    }

    // ===========================================
    // Parsing
    // ===========================================

    #[test]
    fn test_parse_minimal() {
        let config = parse_config(MINIMAL).expect("parse");

        assert_eq!(config.archive_root, PathBuf::from("/backups/web01/archive"));
        assert_eq!(config.sync_dir, PathBuf::from("/backups/web01/files"));
        assert_eq!(config.hostdir_name, "web01");
        assert_eq!(config.backend, BackendConfig::Default);
        assert_eq!(config.policy.get(&RetentionBucket::Incremental), Some(6));
        assert_eq!(
            config.policy.get(&RetentionBucket::Periodic {
                offset: 1,
                interval: Interval::Daily,
            }),
            Some(7)
        );
    }

    #[test]
    fn test_parse_btrfs() {
        let config = parse_config(&with_local("snapshot-backend = \"btrfs\"")).expect("parse");
        assert_eq!(config.backend, BackendConfig::Btrfs);
    }

    #[test]
    fn test_parse_zfs() {
        let config = parse_config(&with_local(
            "snapshot-backend = \"zfs\"\nzfs-dataset = \"tank/web01\"\nzfs-mountpoint = \"/tank/web01\"",
        ))
        .expect("parse");

        assert_eq!(
            config.backend,
            BackendConfig::Zfs {
                dataset: "tank/web01".to_string(),
                mountpoint: Some(PathBuf::from("/tank/web01")),
            }
        );
    }

    #[test]
    fn test_parse_zfs_without_mountpoint() {
        let config = parse_config(&with_local("snapshot-backend = \"zfs\"\nzfs-dataset = \"tank/web01\""))
            .expect("parse");
        assert!(matches!(config.backend, BackendConfig::Zfs { mountpoint: None, .. }));
    }

    #[test]
    fn test_retain_zero_is_valid() {
        let config = parse_config(
            "[local]\nrootdir = \"/backups\"\nhostdir-name = \"web01\"\n[snapshots]\n\"1-yearly\" = 0\n",
        )
        .expect("parse");
        assert_eq!(config.policy.len(), 1);
    }

    // ===========================================
    // Validation
    // ===========================================

    #[test]
    fn test_relative_rootdir() {
        let err = parse_config(
            "[local]\nrootdir = \"backups\"\nhostdir-name = \"web01\"\n[snapshots]\nincremental = 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::RelativeRootdir(_)));
    }

    #[test]
    fn test_hostdir_with_slash() {
        let err = parse_config(
            "[local]\nrootdir = \"/backups\"\nhostdir-name = \"web/01\"\n[snapshots]\nincremental = 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Policy(PolicyError::InvalidHostdir(_))));
    }

    #[test]
    fn test_hostdir_parent_dir() {
        let err = parse_config(
            "[local]\nrootdir = \"/backups\"\nhostdir-name = \"..\"\n[snapshots]\nincremental = 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Policy(PolicyError::InvalidHostdir(_))));
    }

    #[test]
    fn test_unknown_backend() {
        let err = parse_config(&with_local("snapshot-backend = \"lvm\"")).unwrap_err();
        assert!(matches!(err, ConfigError::Backend(_)));
        assert!(err.to_string().contains("lvm"));
    }

    #[test]
    fn test_zfs_requires_dataset() {
        for extra in ["snapshot-backend = \"zfs\"", "snapshot-backend = \"zfs\"\nzfs-dataset = \" \""] {
            let err = parse_config(&with_local(extra)).unwrap_err();
            assert!(matches!(err, ConfigError::MissingDataset), "config {extra:?}");
        }
    }

    #[test]
    fn test_zfs_relative_mountpoint() {
        let err = parse_config(&with_local(
            "snapshot-backend = \"zfs\"\nzfs-dataset = \"tank\"\nzfs-mountpoint = \"tank\"",
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::RelativeMountpoint(_)));
    }

    #[test]
    fn test_empty_snapshots_table() {
        let err = parse_config("[local]\nrootdir = \"/backups\"\nhostdir-name = \"web01\"\n[snapshots]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Policy(PolicyError::Empty)));
    }

    #[test]
    fn test_malformed_bucket() {
        let err = parse_config(
            "[local]\nrootdir = \"/backups\"\nhostdir-name = \"web01\"\n[snapshots]\n\"daily\" = 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Policy(PolicyError::MalformedBucket(_))));
    }

    #[test]
    fn test_negative_count() {
        let err = parse_config(
            "[local]\nrootdir = \"/backups\"\nhostdir-name = \"web01\"\n[snapshots]\nincremental = -1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Policy(PolicyError::InvalidCount { count: -1, .. })));
    }

    #[test]
    fn test_non_integer_count() {
        let err = parse_config(
            "[local]\nrootdir = \"/backups\"\nhostdir-name = \"web01\"\n[snapshots]\nincremental = \"3\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse_config(&with_local("hostdir = \"web01\"")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_section() {
        let err = parse_config("[snapshots]\nincremental = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    // ===========================================
    // Loading
    // ===========================================

    #[test]
    fn test_load_config_from_filesystem() {
        let fs = MockFilesystem::new();
        fs.write_file("/etc/poppins/web01.toml", MINIMAL);

        let config = load_config(&fs, Path::new("/etc/poppins/web01.toml")).expect("load");
        assert_eq!(config.hostdir_name, "web01");
    }

    #[test]
    fn test_load_config_missing_file() {
        let fs = MockFilesystem::new();
        let err = load_config(&fs, Path::new("/etc/poppins/missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn test_load_config_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("web01.toml");
        std::fs::write(&path, MINIMAL).expect("write config");

        let config = load_config(&poppins_fs::RealFilesystem, &path).expect("load");
        assert_eq!(config.archive_root, PathBuf::from("/backups/web01/archive"));
        assert_eq!(config.policy.len(), 2);
    }
}
