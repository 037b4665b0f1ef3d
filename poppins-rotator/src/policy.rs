//! Retention policy: how many snapshots each bucket keeps.

use std::collections::BTreeMap;

use crate::bucket::RetentionBucket;
use crate::error::PolicyError;

/// Mapping from bucket to the maximum number of snapshots kept.
///
/// Iteration follows bucket order (incremental first, then ascending
/// threshold). A count of zero disables the bucket: it is drained every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    counts: BTreeMap<RetentionBucket, usize>,
}

impl RetentionPolicy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: keep `count` snapshots in `bucket`.
    pub fn with(mut self, bucket: RetentionBucket, count: usize) -> Self {
        self.counts.insert(bucket, count);
        self
    }

    /// Build a policy from raw `(key, count)` pairs as found in a config file.
    pub fn from_entries<I, K>(entries: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        let mut counts = BTreeMap::new();

        for (key, count) in entries {
            let bucket = RetentionBucket::parse(key.as_ref())?;
            let count = usize::try_from(count).map_err(|_| PolicyError::InvalidCount {
                bucket: bucket.to_string(),
                count,
            })?;
            if counts.insert(bucket, count).is_some() {
                return Err(PolicyError::DuplicateBucket(bucket.to_string()));
            }
        }

        if counts.is_empty() {
            return Err(PolicyError::Empty);
        }

        Ok(Self { counts })
    }

    /// Retention count of `bucket`, if configured.
    pub fn get(&self, bucket: &RetentionBucket) -> Option<usize> {
        self.counts.get(bucket).copied()
    }

    /// Configured buckets in processing order.
    pub fn buckets(&self) -> impl Iterator<Item = &RetentionBucket> {
        self.counts.keys()
    }

    /// `(bucket, count)` pairs in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (&RetentionBucket, usize)> {
        self.counts.iter().map(|(bucket, count)| (bucket, *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
