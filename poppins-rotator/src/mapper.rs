//! Archive mapping.
//!
//! Scans the archive as it exists right now and groups valid snapshots by
//! bucket. Nothing is cached between runs; the filesystem is the only
//! source of truth.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use poppins_fs::{EntryKind, Filesystem};
use serde::{Serialize, Serializer};

use crate::bucket::RetentionBucket;
use crate::error::RotateError;
use crate::policy::RetentionPolicy;
use crate::snapshot::{NamePattern, SnapshotName};

/// Entries starting with this prefix are never reported as unclean.
pub const IGNORE_PREFIX: char = '_';

/// Snapshots per bucket, each list in ascending dirstamp order.
pub type ArchiveState = BTreeMap<RetentionBucket, Vec<SnapshotName>>;

/// Where a backend keeps its snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// One directory per bucket, `<root>/<bucket-key>/<name>`.
    PerBucket { root: PathBuf },
    /// A single listing for all buckets; entries are `<bucket-key>-<name>`.
    Shared { dir: PathBuf },
}

/// A physical directory to scan and the buckets it may hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketDir {
    pub path: PathBuf,
    pub buckets: Vec<RetentionBucket>,
}

/// An archive entry that is neither a snapshot nor explicitly ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncleanEntry {
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_kind")]
    pub kind: EntryKind,
}

fn serialize_kind<S: Serializer>(kind: &EntryKind, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(kind)
}

/// Result of one archive scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveScan {
    pub state: ArchiveState,
    pub unclean: Vec<UncleanEntry>,
}

/// Maps an archive layout to the current [`ArchiveState`].
pub struct ArchiveMapper<'a> {
    fs: &'a dyn Filesystem,
    layout: ArchiveLayout,
    pattern: NamePattern,
}

impl<'a> ArchiveMapper<'a> {
    pub fn new(
        fs: &'a dyn Filesystem,
        layout: ArchiveLayout,
        hostdir: &str,
    ) -> Result<Self, RotateError> {
        Ok(Self {
            fs,
            layout,
            pattern: NamePattern::new(hostdir)?,
        })
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    /// Directories that currently exist and hold snapshots of `policy` buckets.
    pub fn discover_buckets(&self, policy: &RetentionPolicy) -> Vec<BucketDir> {
        match &self.layout {
            ArchiveLayout::PerBucket { root } => policy
                .buckets()
                .map(|bucket| BucketDir {
                    path: root.join(bucket.to_string()),
                    buckets: vec![*bucket],
                })
                .filter(|dir| self.fs.is_dir(&dir.path))
                .collect(),
            ArchiveLayout::Shared { dir } if self.fs.is_dir(dir) => vec![BucketDir {
                path: dir.clone(),
                buckets: policy.buckets().copied().collect(),
            }],
            ArchiveLayout::Shared { .. } => Vec::new(),
        }
    }

    /// Scan the archive. Every policy bucket gets an entry, possibly empty.
    pub fn scan(&self, policy: &RetentionPolicy) -> Result<ArchiveScan, RotateError> {
        let mut scan = ArchiveScan {
            state: policy.buckets().map(|bucket| (*bucket, Vec::new())).collect(),
            unclean: Vec::new(),
        };

        if let ArchiveLayout::PerBucket { root } = &self.layout {
            self.scan_root(root, policy, &mut scan)?;
        }

        for dir in self.discover_buckets(policy) {
            for entry in self.fs.list_dir(&dir.path)? {
                if entry.name.starts_with(IGNORE_PREFIX) {
                    continue;
                }

                match self.classify(&dir.buckets, &entry.name) {
                    Some((bucket, name)) => {
                        // A shape match with an impossible date must not be sorted or sliced
                        if name.dirstamp().is_err() {
                            return Err(RotateError::TimestampFormat {
                                bucket,
                                name: entry.name,
                            });
                        }
                        if let Some(names) = scan.state.get_mut(&bucket) {
                            names.push(name);
                        }
                    }
                    None => scan.unclean.push(UncleanEntry {
                        path: dir.path.join(&entry.name),
                        kind: entry.kind,
                    }),
                }
            }
        }

        for names in scan.state.values_mut() {
            names.sort();
        }

        Ok(scan)
    }

    /// Flag entries of the archive root that are not configured bucket directories.
    ///
    /// A bucket key that is a symlink to a directory counts as a bucket
    /// directory, matching what [`Self::discover_buckets`] scans.
    fn scan_root(
        &self,
        root: &Path,
        policy: &RetentionPolicy,
        scan: &mut ArchiveScan,
    ) -> Result<(), RotateError> {
        if !self.fs.is_dir(root) {
            return Ok(());
        }

        let keys: Vec<String> = policy.buckets().map(ToString::to_string).collect();
        for entry in self.fs.list_dir(root)? {
            let known = keys.contains(&entry.name) && self.fs.is_dir(&root.join(&entry.name));
            if !known && !entry.name.starts_with(IGNORE_PREFIX) {
                scan.unclean.push(UncleanEntry {
                    path: root.join(&entry.name),
                    kind: entry.kind,
                });
            }
        }
        Ok(())
    }

    fn classify(
        &self,
        buckets: &[RetentionBucket],
        entry: &str,
    ) -> Option<(RetentionBucket, SnapshotName)> {
        match &self.layout {
            ArchiveLayout::PerBucket { .. } => {
                let bucket = buckets.first()?;
                self.pattern.parse(entry).map(|name| (*bucket, name))
            }
            ArchiveLayout::Shared { .. } => buckets.iter().find_map(|bucket| {
                self.pattern
                    .parse_label(bucket, entry)
                    .map(|name| (*bucket, name))
            }),
        }
    }
}
