use std::process::ExitCode;

use clap::Parser;
use dropkit_cli::{exit_code, run_counts, CountsArgs};

fn main() -> ExitCode {
    let args = CountsArgs::parse();
    if let Err(err) = args.validate() {
        err.exit();
    }

    match run_counts(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => exit_code(&err),
    }
}
