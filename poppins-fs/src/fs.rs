//! Filesystem abstraction for poppins.
//!
//! The archive mapper only needs to list directories and tell entry types
//! apart; the backends additionally create directories and symlinks, and
//! the command line reads its configuration file through it.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Errors from filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("path error: {0}")]
    Path(String),
}

/// Type of a directory entry, as reported without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Other,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::File => "file",
            EntryKind::Dir => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "other",
        })
    }
}

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Trait for filesystem operations.
/// Abstracted for testing with mock implementations.
pub trait Filesystem: Send + Sync {
    /// List the entries of a directory, sorted by name.
    fn list_dir(&self, dir: &Path) -> Result<Vec<DirEntry>, FsError>;

    /// Check if an entry exists at `path` (a dangling symlink counts).
    fn exists(&self, path: &Path) -> bool;

    /// Check if `path` resolves to a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create directory and parents if needed.
    fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;

    /// Create a symlink at `link` pointing to `target`.
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError>;

    /// Read a whole file as UTF-8.
    fn read_file(&self, path: &Path) -> Result<String, FsError>;
}

/// Real filesystem implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn list_dir(&self, dir: &Path) -> Result<Vec<DirEntry>, FsError> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            entries.push(DirEntry::new(entry.file_name().to_string_lossy(), kind));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    #[cfg(unix)]
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError> {
        std::os::unix::fs::symlink(target, link)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn symlink(&self, _target: &Path, link: &Path) -> Result<(), FsError> {
        Err(FsError::Path(format!(
            "symlinks are not supported on this platform: {}",
            link.display()
        )))
    }

    fn read_file(&self, path: &Path) -> Result<String, FsError> {
        Ok(fs::read_to_string(path)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MockEntry {
    File(String),
    Dir,
    Symlink(PathBuf),
}

/// Mock filesystem for testing.
/// Cloning creates a new handle to the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MockFilesystem {
    entries: Arc<RwLock<BTreeMap<PathBuf, MockEntry>>>,
}

impl MockFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file directly (for test setup). Parent directories are created.
    pub fn add_file(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.add_parents(&path);
        self.entries
            .write()
            .unwrap()
            .insert(path, MockEntry::File(String::new()));
    }

    /// Add a file with contents (for test setup). Parent directories are created.
    pub fn write_file(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let path = path.into();
        self.add_parents(&path);
        self.entries
            .write()
            .unwrap()
            .insert(path, MockEntry::File(contents.into()));
    }

    /// Add a directory and its parents (for test setup).
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.add_parents(&path);
        self.entries.write().unwrap().insert(path, MockEntry::Dir);
    }

    /// Remove an entry and everything beneath it.
    pub fn remove_tree(&self, path: &Path) {
        self.entries
            .write()
            .unwrap()
            .retain(|p, _| !(p == path || p.starts_with(path)));
    }

    /// Target of the symlink at `link`, if any.
    pub fn symlink_target(&self, link: &Path) -> Option<PathBuf> {
        match self.entries.read().unwrap().get(link) {
            Some(MockEntry::Symlink(target)) => Some(target.clone()),
            _ => None,
        }
    }

    /// All paths currently present, in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.read().unwrap().keys().cloned().collect()
    }

    fn add_parents(&self, path: &Path) {
        let mut entries = self.entries.write().unwrap();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Dir);
        }
    }
}

impl Filesystem for MockFilesystem {
    fn list_dir(&self, dir: &Path) -> Result<Vec<DirEntry>, FsError> {
        if !self.is_dir(dir) {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {}", dir.display()),
            )));
        }

        let dir = match self.symlink_target(dir) {
            Some(target) => target,
            None => dir.to_path_buf(),
        };

        // BTreeMap keys are sorted, so children come out sorted by name
        let entries = self.entries.read().unwrap();
        let listing = entries
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir.as_path()))
            .filter_map(|(path, entry)| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                let kind = match entry {
                    MockEntry::File(_) => EntryKind::File,
                    MockEntry::Dir => EntryKind::Dir,
                    MockEntry::Symlink(_) => EntryKind::Symlink,
                };
                Some(DirEntry::new(name, kind))
            })
            .collect();

        Ok(listing)
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.read().unwrap().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let entries = self.entries.read().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir) => true,
            Some(MockEntry::Symlink(target)) => matches!(entries.get(target), Some(MockEntry::Dir)),
            _ => false,
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        if let Some(MockEntry::File(_)) = self.entries.read().unwrap().get(path) {
            return Err(FsError::Path(format!(
                "not a directory: {}",
                path.display()
            )));
        }
        self.add_dir(path);
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError> {
        if self.exists(link) {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file exists: {}", link.display()),
            )));
        }
        self.add_parents(link);
        self.entries
            .write()
            .unwrap()
            .insert(link.to_path_buf(), MockEntry::Symlink(target.to_path_buf()));
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<String, FsError> {
        match self.entries.read().unwrap().get(path) {
            Some(MockEntry::File(contents)) => Ok(contents.clone()),
            Some(_) => Err(FsError::Path(format!("not a file: {}", path.display()))),
            None => Err(FsError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            ))),
        }
    }
}
