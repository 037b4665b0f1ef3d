//! poppins CLI binary.
//!
//! Entry point for the `poppins` command-line tool.

use std::process::ExitCode;

use clap::Parser;
use poppins_cli::exit::{codes, exit_code};
use poppins_cli::{execute, Cli};
use poppins_clock::SystemClock;
use poppins_fs::{RealFilesystem, ShellRunner};
use poppins_rotator::{StderrLogger, Verbosity};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = StderrLogger::new(Verbosity::from_count(cli.verbose));

    match execute(&cli, &RealFilesystem, &ShellRunner::new(), &SystemClock, &logger) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::from(codes::SUCCESS as u8)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}
