//! Run reports for display and JSON output.

use std::fmt;

use serde::Serialize;

use crate::backend::BackendKind;
use crate::bucket::RetentionBucket;
use crate::mapper::{ArchiveScan, UncleanEntry};
use crate::plan::Plan;
use crate::policy::RetentionPolicy;
use crate::snapshot::SnapshotName;

/// Contents of one bucket after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketReport {
    pub bucket: RetentionBucket,
    pub retain: usize,
    /// Newest first.
    pub snapshots: Vec<SnapshotName>,
    pub added: Vec<SnapshotName>,
    pub removed: Vec<SnapshotName>,
}

impl BucketReport {
    fn new(bucket: RetentionBucket, retain: usize, ascending: &[SnapshotName]) -> Self {
        Self {
            bucket,
            retain,
            snapshots: ascending.iter().rev().cloned().collect(),
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// What a run did (or, for a dry run, would do) to the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Rotation time; absent for a plain listing.
    pub now: Option<String>,
    pub backend: BackendKind,
    pub dry_run: bool,
    pub buckets: Vec<BucketReport>,
    pub unclean: Vec<UncleanEntry>,
}

impl Report {
    /// Report for an applied or planned rotation.
    pub fn from_plan(plan: &Plan, backend: BackendKind, dry_run: bool, unclean: Vec<UncleanEntry>) -> Self {
        let buckets = plan
            .buckets
            .iter()
            .map(|bucket_plan| BucketReport {
                added: bucket_plan.to_add.clone(),
                removed: bucket_plan.to_remove.clone(),
                ..BucketReport::new(bucket_plan.bucket, bucket_plan.retain, &bucket_plan.candidate)
            })
            .collect();

        Self {
            now: Some(plan.now.to_string()),
            backend,
            dry_run,
            buckets,
            unclean,
        }
    }

    /// Report of the archive as found, without any rotation.
    pub fn from_scan(scan: &ArchiveScan, policy: &RetentionPolicy, backend: BackendKind) -> Self {
        let buckets = policy
            .iter()
            .map(|(bucket, retain)| {
                let found = scan.state.get(bucket).map(Vec::as_slice).unwrap_or_default();
                BucketReport::new(*bucket, retain, found)
            })
            .collect();

        Self {
            now: None,
            backend,
            dry_run: false,
            buckets,
            unclean: scan.unclean.clone(),
        }
    }

    pub fn total_added(&self) -> usize {
        self.buckets.iter().map(|b| b.added.len()).sum()
    }

    pub fn total_removed(&self) -> usize {
        self.buckets.iter().map(|b| b.removed.len()).sum()
    }

    /// One-line summary of the mutations.
    pub fn summary(&self) -> String {
        let (added, removed) = (self.total_added(), self.total_removed());
        if self.dry_run {
            format!("dry run: would add {added}, would remove {removed}")
        } else {
            format!("{added} added, {removed} removed")
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.now {
            Some(now) => writeln!(f, "rotation at {} ({} backend)", now, self.backend)?,
            None => writeln!(f, "archive ({} backend)", self.backend)?,
        }

        for bucket in &self.buckets {
            writeln!(f, "{} ({}/{})", bucket.bucket, bucket.snapshots.len(), bucket.retain)?;
            for name in &bucket.snapshots {
                let marker = if bucket.added.contains(name) { "+" } else { " " };
                writeln!(f, "  {} {}", marker, name)?;
            }
            for name in &bucket.removed {
                writeln!(f, "  - {}", name)?;
            }
        }

        if !self.unclean.is_empty() {
            writeln!(f, "unclean entries:")?;
            for entry in &self.unclean {
                writeln!(f, "  {} ({})", entry.path.display(), entry.kind)?;
            }
        }

        if self.now.is_some() {
            writeln!(f, "{}", self.summary())?;
        }
        Ok(())
    }
}
