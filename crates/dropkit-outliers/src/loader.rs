//! Load outlier results and keep only the requested cohort.

use std::path::Path;

use dropkit_common::io::read_table;
use dropkit_common::{DropkitError, Result, SampleId, Table};
use tracing::{info, warn};

use crate::columns::{ABERRANT, GENE_ID, P_VALUE, SAMPLE_ID};
use crate::store::ResultStore;

/// Columns every expression results table must carry.
pub const EXPRESSION_COLUMNS: [&str; 4] = [SAMPLE_ID, GENE_ID, P_VALUE, ABERRANT];

/// Take the single unnamed table from `store` and restrict it to `samples`.
pub fn load_expression_results(store: &dyn ResultStore, samples: &[SampleId]) -> Result<Table> {
    let origin = store.describe();
    let mut unnamed: Vec<Table> = store
        .tables()?
        .into_iter()
        .filter(|t| t.name.is_none())
        .map(|t| t.table)
        .collect();

    if unnamed.len() != 1 {
        return Err(DropkitError::ResultTable(format!(
            "expected exactly one unnamed table in {origin}, found {}",
            unnamed.len()
        )));
    }
    let table = unnamed.remove(0);
    if table.is_empty() {
        return Err(DropkitError::ResultTable(format!(
            "results table in {origin} has no rows"
        )));
    }
    table.require_columns(&EXPRESSION_COLUMNS, &origin)?;

    restrict_to_cohort(&table, samples, &origin)
}

/// Field delimiter of the splicing results, tab whatever the file name.
pub const SPLICING_DELIMITER: u8 = b'\t';

/// Read the splicing results file and restrict it to `samples`.
pub fn load_splicing_results(path: &Path, samples: &[SampleId]) -> Result<Table> {
    let table = read_table(path, SPLICING_DELIMITER)?;
    let origin = path.display().to_string();
    table.require_column(SAMPLE_ID, &origin)?;
    restrict_to_cohort(&table, samples, &origin)
}

fn restrict_to_cohort(table: &Table, samples: &[SampleId], origin: &str) -> Result<Table> {
    let cohort = table.filter_in(SAMPLE_ID, samples)?;
    info!(
        "{}: {} of {} rows belong to the {} requested samples",
        origin,
        cohort.len(),
        table.len(),
        samples.len()
    );
    if cohort.is_empty() {
        warn!("{}: none of the requested samples have results", origin);
    }
    Ok(cohort)
}
