//! dropkit-cli: The `drop-counts` and `drop-filter-results` entry points.

pub mod args;
pub mod logging;
pub mod run;

pub use args::{CommonArgs, CountsArgs, FilterArgs};
pub use run::{exit_code, exit_status, run_counts, run_filter};
