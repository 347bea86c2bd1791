use std::process::ExitCode;

use clap::Parser;
use dropkit_cli::{exit_code, run_filter, FilterArgs};

fn main() -> ExitCode {
    let args = FilterArgs::parse();
    if let Err(err) = args.validate() {
        err.exit();
    }

    match run_filter(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => exit_code(&err),
    }
}
