//! What each binary does after its arguments are validated.

use std::fs;
use std::process::ExitCode;

use anyhow::Context;
use dropkit_common::io::write_json;
use dropkit_common::DropkitError;
use dropkit_config::Config;
use dropkit_counts::collate_counts;
use dropkit_outliers::filter_results;
use tracing::info;

use crate::args::{CommonArgs, CountsArgs, FilterArgs, VERSION};
use crate::logging;

fn load_config(common: &CommonArgs) -> anyhow::Result<Config> {
    let config = Config::load(common.config.as_deref())?;
    logging::init(&config.logging.filter);
    Ok(config)
}

pub fn run_counts(args: &CountsArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    info!("drop-counts {}", VERSION);

    let request = args.to_request(&config);
    if let Some(parent) = request.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let summary = collate_counts(&request)?;
    if let Some(path) = &args.common.audit {
        write_json(&summary, path)?;
        info!("Run report written to {:?}", path);
    }
    Ok(())
}

pub fn run_filter(args: &FilterArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    info!("drop-filter-results {}", VERSION);

    let report = filter_results(&args.to_request(&config))?;
    if let Some(path) = &args.common.audit {
        report.write_json(path)?;
        info!("Run report written to {:?}", path);
    }
    Ok(())
}

/// Exit status for a failed run: 2 for usage and configuration mistakes, 1 otherwise.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    let usage = err
        .downcast_ref::<DropkitError>()
        .map(DropkitError::is_usage)
        .unwrap_or(false);
    if usage {
        2
    } else {
        1
    }
}

/// Print the error chain and turn it into the process exit code.
pub fn exit_code(err: &anyhow::Error) -> ExitCode {
    eprintln!("Error: {err:#}");
    ExitCode::from(exit_status(err))
}
