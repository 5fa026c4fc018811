//! sfcpack - build pipeline for single-file component libraries

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = sfcpack::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
