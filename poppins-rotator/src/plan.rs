//! Rotation planning: admit, slice and diff.
//!
//! Planning is a pure function of the current archive state, the retention
//! policy and the current time. It touches neither the filesystem nor any
//! backend, so every decision can be tested in isolation.

use std::fmt;

use poppins_clock::Dirstamp;
use serde::Serialize;

use crate::bucket::RetentionBucket;
use crate::error::RotateError;
use crate::mapper::ArchiveState;
use crate::policy::RetentionPolicy;
use crate::snapshot::SnapshotName;

/// Kind of a backend mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Add,
    Remove,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Add => "add",
            ActionKind::Remove => "remove",
        })
    }
}

/// One backend mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub bucket: RetentionBucket,
    pub name: SnapshotName,
}

/// Planned outcome for a single bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPlan {
    pub bucket: RetentionBucket,
    pub retain: usize,
    /// Snapshots found on disk, ascending.
    pub current: Vec<SnapshotName>,
    /// Name admitted this run, if any. It may already be sliced away.
    pub admitted: Option<SnapshotName>,
    /// Snapshots that should exist after the run, ascending.
    pub candidate: Vec<SnapshotName>,
    pub to_add: Vec<SnapshotName>,
    pub to_remove: Vec<SnapshotName>,
}

/// Planned outcome for a whole archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub now: Dirstamp,
    pub buckets: Vec<BucketPlan>,
}

impl Plan {
    /// The archive as it should look after the run.
    pub fn candidate_state(&self) -> ArchiveState {
        self.buckets
            .iter()
            .map(|plan| (plan.bucket, plan.candidate.clone()))
            .collect()
    }

    /// All mutations in application order: bucket by bucket, removals first.
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        for plan in &self.buckets {
            for (kind, names) in [(ActionKind::Remove, &plan.to_remove), (ActionKind::Add, &plan.to_add)] {
                actions.extend(names.iter().map(|name| Action {
                    kind,
                    bucket: plan.bucket,
                    name: name.clone(),
                }));
            }
        }
        actions
    }

    pub fn total_added(&self) -> usize {
        self.buckets.iter().map(|plan| plan.to_add.len()).sum()
    }

    pub fn total_removed(&self) -> usize {
        self.buckets.iter().map(|plan| plan.to_remove.len()).sum()
    }
}

/// Decide whether `bucket` gets a new snapshot at `now`.
///
/// `existing` must be sorted ascending. The incremental bucket always
/// admits; a periodic bucket admits when it is empty or when its newest
/// snapshot is at least one threshold old.
pub fn admit(
    bucket: &RetentionBucket,
    existing: &[SnapshotName],
    now: Dirstamp,
) -> Result<bool, RotateError> {
    let newest = match existing.last() {
        Some(newest) if !bucket.is_incremental() => newest,
        _ => return Ok(true),
    };

    let stamp = newest.dirstamp().map_err(|_| RotateError::TimestampFormat {
        bucket: *bucket,
        name: newest.to_string(),
    })?;

    let diff = now.seconds_since(&stamp);
    if diff < 0 {
        return Err(RotateError::ClockOrdering {
            bucket: *bucket,
            newest: newest.stamp().to_string(),
            now: now.to_string(),
        });
    }

    Ok(bucket.exceeds(diff)?)
}

/// Plan one bucket.
pub fn plan_bucket(
    bucket: &RetentionBucket,
    retain: usize,
    current: &[SnapshotName],
    now: Dirstamp,
    hostdir: &str,
) -> Result<BucketPlan, RotateError> {
    let mut candidate = current.to_vec();

    let admitted = if admit(bucket, current, now)? {
        let name = SnapshotName::new(hostdir, now);
        // A second run within the same second must not add a duplicate
        if candidate.contains(&name) {
            None
        } else {
            candidate.push(name.clone());
            candidate.sort();
            Some(name)
        }
    } else {
        None
    };

    let keep_from = candidate.len().saturating_sub(retain);
    let candidate = candidate.split_off(keep_from);

    let to_remove = current
        .iter()
        .filter(|name| !candidate.contains(name))
        .cloned()
        .collect();
    let to_add = candidate
        .iter()
        .filter(|name| !current.contains(name))
        .cloned()
        .collect();

    Ok(BucketPlan {
        bucket: *bucket,
        retain,
        current: current.to_vec(),
        admitted,
        candidate,
        to_add,
        to_remove,
    })
}

/// Plan every bucket of `policy` against `state`.
///
/// Buckets are independent: a snapshot admitted to one bucket is never
/// moved into or shared with another.
pub fn plan(
    state: &ArchiveState,
    policy: &RetentionPolicy,
    now: Dirstamp,
    hostdir: &str,
) -> Result<Plan, RotateError> {
    let buckets = policy
        .iter()
        .map(|(bucket, retain)| {
            let current = state.get(bucket).map(Vec::as_slice).unwrap_or_default();
            plan_bucket(bucket, retain, current, now, hostdir)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Plan { now, buckets })
}
