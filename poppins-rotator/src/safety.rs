//! Removal target guards.
//!
//! Every backend checks its deletion target here immediately before issuing
//! the delete, regardless of any validation done when the config was loaded.

use std::path::{Component, Path};

use crate::error::RotateError;

/// Refuse paths that are empty, only slashes, or climb with `..`.
pub fn guard_removal_path(path: &Path) -> Result<(), RotateError> {
    let text = path.to_string_lossy();
    if is_blank_or_root(&text) || path.components().any(|c| c == Component::ParentDir) {
        return Err(RotateError::UnsafeRemovalTarget(text.into_owned()));
    }
    Ok(())
}

/// Refuse ZFS destroy targets that are not `<dataset>@<label>`.
///
/// `zfs destroy` on a target without `@` destroys the dataset itself.
pub fn guard_zfs_snapshot(target: &str) -> Result<(), RotateError> {
    let unsafe_target = || RotateError::UnsafeRemovalTarget(target.to_string());

    if is_blank_or_root(target) {
        return Err(unsafe_target());
    }
    let (dataset, label) = target.split_once('@').ok_or_else(unsafe_target)?;
    if is_blank_or_root(dataset) || label.trim().is_empty() || label.contains(['@', '/']) {
        return Err(unsafe_target());
    }
    Ok(())
}

fn is_blank_or_root(text: &str) -> bool {
    text.trim().chars().all(|c| c == '/')
}
