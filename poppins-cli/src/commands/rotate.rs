//! Rotate command orchestration.

use poppins_clock::Clock;
use poppins_fs::{CommandRunner, Filesystem};
use poppins_rotator::{Logger, Report, Rotator, RotatorConfig};

use crate::cli::RotateArgs;

use super::CommandResult;

/// Execute the rotate command.
///
/// With `--dry-run` the archive is mapped and planned but never modified.
pub fn execute_rotate<F, R, C, L>(
    args: &RotateArgs,
    config: &RotatorConfig,
    fs: &F,
    runner: &R,
    clock: &C,
    logger: &L,
) -> CommandResult<Report>
where
    F: Filesystem,
    R: CommandRunner,
    C: Clock,
    L: Logger,
{
    let mut rotator = Rotator::new(config, fs, runner, logger)?;
    let now = clock.now();

    let report = if args.dry_run {
        logger.notice(&format!("dry run at {}, archive is not modified", now));
        rotator.dry_run(now)?
    } else {
        rotator.run(now)?
    };
    Ok(report)
}
