//! List command orchestration.

use poppins_fs::{CommandRunner, Filesystem};
use poppins_rotator::{Logger, Report, Rotator, RotatorConfig};

use super::CommandResult;

/// Execute the list command.
///
/// Only reads the archive. The ZFS backend may run `zfs get` to find the
/// dataset's mountpoint.
pub fn execute_list<F, R, L>(
    config: &RotatorConfig,
    fs: &F,
    runner: &R,
    logger: &L,
) -> CommandResult<Report>
where
    F: Filesystem,
    R: CommandRunner,
    L: Logger,
{
    let mut rotator = Rotator::new(config, fs, runner, logger)?;
    Ok(rotator.survey()?)
}
