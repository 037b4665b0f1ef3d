//! Filesystem and command abstractions for poppins.
//!
//! This crate provides:
//! - Filesystem trait for directory listing, creation, symlinks and reading config files
//! - CommandRunner trait for the external programs that create and destroy snapshots

pub mod command;
pub mod fs;

pub use command::{CommandError, CommandOutput, CommandRunner, MockRunner, ShellCommand, ShellRunner};
pub use fs::{DirEntry, EntryKind, Filesystem, FsError, MockFilesystem, RealFilesystem};
