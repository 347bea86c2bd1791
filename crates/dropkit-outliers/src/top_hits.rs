//! Per-sample top-hit selection for expression outliers.
//!
//! A sample with at least `threshold` aberrant calls keeps all of its rows in input
//! order. Otherwise all of its rows (aberrant or not) are stably sorted by ascending
//! p-value and the first `threshold` are kept.

use std::cmp::Ordering;
use std::collections::HashSet;

use dropkit_common::{DropkitError, Result, SampleId, Table};
use serde::Serialize;
use tracing::{info, warn};

use crate::columns::{ABERRANT, P_VALUE, SAMPLE_ID};

/// Which branch of the selection rule applied to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionRule {
    AllAberrant,
    LowestPValue,
}

/// Per-sample outcome of the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSelection {
    pub sample: SampleId,
    pub total: usize,
    pub aberrant: usize,
    pub kept: usize,
    pub rule: SelectionRule,
}

#[derive(Debug, Clone)]
pub struct TopHits {
    /// Selected rows, grouped by sample in request order.
    pub table: Table,
    pub selections: Vec<SampleSelection>,
}

/// Parse a boolean-like cell as written by R or pandas. Missing values are false.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "TRUE" | "True" | "true" | "T" | "1" => Some(true),
        "FALSE" | "False" | "false" | "F" | "0" | "" | "NA" | "nan" | "NaN" => Some(false),
        _ => None,
    }
}

/// Parse a p-value cell; `None` for missing values, which sort last.
fn parse_p_value(value: &str) -> std::result::Result<Option<f64>, ()> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(p) if p.is_nan() => Ok(None),
        Ok(p) => Ok(Some(p)),
        Err(_) => Err(()),
    }
}

fn by_p_value(a: &Option<f64>, b: &Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Select top hits for each sample in `samples`, in that order.
pub fn select_top_hits(results: &Table, samples: &[SampleId], threshold: usize) -> Result<TopHits> {
    let idx = results.require_columns(&[SAMPLE_ID, P_VALUE, ABERRANT], "expression results")?;
    let (sample_col, p_col, aberrant_col) = (idx[0], idx[1], idx[2]);

    let mut table = Table::new(results.columns().to_vec());
    let mut selections = Vec::with_capacity(samples.len());
    let mut seen = HashSet::new();

    for sample in samples {
        if !seen.insert(sample) {
            warn!("Sample {} requested more than once; selecting it once", sample);
            continue;
        }

        let rows: Vec<usize> = results
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| row[sample_col] == sample.as_str())
            .map(|(i, _)| i)
            .collect();

        let mut aberrant = 0usize;
        for &i in &rows {
            let cell = &results.rows()[i][aberrant_col];
            match parse_flag(cell) {
                Some(true) => aberrant += 1,
                Some(false) => {}
                None => {
                    return Err(DropkitError::ResultTable(format!(
                        "sample {sample}: '{cell}' in column {ABERRANT} is not a boolean"
                    )))
                }
            }
        }

        let (kept, rule) = if aberrant >= threshold {
            (rows.clone(), SelectionRule::AllAberrant)
        } else {
            let mut keyed = Vec::with_capacity(rows.len());
            for &i in &rows {
                let cell = &results.rows()[i][p_col];
                let p = parse_p_value(cell).map_err(|_| {
                    DropkitError::ResultTable(format!(
                        "sample {sample}: '{cell}' in column {P_VALUE} is not a number"
                    ))
                })?;
                keyed.push((i, p));
            }
            // sort_by is stable: equal p-values keep their input order.
            keyed.sort_by(|a, b| by_p_value(&a.1, &b.1));
            keyed.truncate(threshold);
            (keyed.into_iter().map(|(i, _)| i).collect(), SelectionRule::LowestPValue)
        };

        let selection = SampleSelection {
            sample: sample.clone(),
            total: rows.len(),
            aberrant,
            kept: kept.len(),
            rule,
        };
        info!(
            "Sample {}: {} rows, {} aberrant, kept {} ({:?})",
            sample, selection.total, selection.aberrant, selection.kept, selection.rule
        );
        if rows.is_empty() {
            warn!("Sample {} has no expression results", sample);
        }

        table.extend(results.take(&kept))?;
        selections.push(selection);
    }

    Ok(TopHits { table, selections })
}
