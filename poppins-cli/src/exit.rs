//! Exit codes for the poppins CLI.
//!
//! Following Unix conventions for exit codes.

use poppins_rotator::RotateError;

use crate::commands::CommandFailure;
use crate::config::ConfigError;

/// Exit code constants.
pub mod codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Invalid arguments or configuration.
    pub const INVALID_CONFIG: i32 = 1;
    /// IO error.
    pub const IO_ERROR: i32 = 2;
    /// Archive contents contradict the clock or the naming scheme.
    pub const ARCHIVE_STATE: i32 = 3;
    /// A snapshot command failed.
    pub const BACKEND_FAILURE: i32 = 4;
    /// A deletion target was refused by the safety guard.
    pub const UNSAFE_TARGET: i32 = 5;
}

/// Map a CommandFailure to an exit code.
pub fn exit_code(error: &CommandFailure) -> i32 {
    match error {
        CommandFailure::InvalidArgument(_) => codes::INVALID_CONFIG,
        CommandFailure::Config(ConfigError::Read(_)) => codes::IO_ERROR,
        CommandFailure::Config(_) => codes::INVALID_CONFIG,
        CommandFailure::Rotate(err) => rotate_exit_code(err),
        CommandFailure::Output(_) => codes::IO_ERROR,
    }
}

fn rotate_exit_code(error: &RotateError) -> i32 {
    match error {
        RotateError::Policy(_) | RotateError::Pattern(_) => codes::INVALID_CONFIG,
        RotateError::TimestampFormat { .. } | RotateError::ClockOrdering { .. } | RotateError::Time(_) => {
            codes::ARCHIVE_STATE
        }
        RotateError::BackendCommand { .. } | RotateError::MountpointLookup { .. } | RotateError::Command(_) => {
            codes::BACKEND_FAILURE
        }
        RotateError::UnsafeRemovalTarget(_) => codes::UNSAFE_TARGET,
        RotateError::Filesystem(_) => codes::IO_ERROR,
    }
}
