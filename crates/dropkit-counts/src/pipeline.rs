//! Count collation: read every sample, build the matrix, reconcile, exclude, write.

use std::path::PathBuf;
use std::time::Instant;

use dropkit_common::{Result, SampleId};
use serde::Serialize;
use tracing::info;

use crate::annotation::load_exclusion_set;
use crate::matrix::CountMatrix;
use crate::star::{read_gene_counts, Strandedness};

/// One sample's aligner output.
#[derive(Debug, Clone)]
pub struct SampleInput {
    pub sample: SampleId,
    pub counts_path: PathBuf,
    pub strandedness: Strandedness,
}

/// Everything needed for one collation run.
#[derive(Debug, Clone)]
pub struct CollateRequest {
    pub inputs: Vec<SampleInput>,
    pub annotation: PathBuf,
    pub reference: Option<PathBuf>,
    pub output: PathBuf,
    pub gzip_level: u32,
}

/// What a collation run produced.
#[derive(Debug, Clone, Serialize)]
pub struct CollateSummary {
    pub output: PathBuf,
    pub samples: usize,
    pub genes_counted: usize,
    pub genes_excluded: usize,
    pub genes_written: usize,
    pub columns_written: usize,
    pub duration_ms: u64,
}

/// Run the collation end to end. Nothing is written unless every stage succeeds.
pub fn collate_counts(request: &CollateRequest) -> Result<CollateSummary> {
    let start = Instant::now();
    info!("Collating counts for {} samples", request.inputs.len());

    let mappings = request
        .inputs
        .iter()
        .map(|input| read_gene_counts(&input.counts_path, input.sample.clone(), input.strandedness))
        .collect::<Result<Vec<_>>>()?;

    let excluded = load_exclusion_set(&request.annotation)?;

    let mut matrix = CountMatrix::from_mappings(&mappings)?;
    let genes_counted = matrix.n_genes();

    if let Some(reference) = &request.reference {
        info!("Reconciling with reference matrix {:?}", reference);
        let reference = CountMatrix::read(reference)?;
        matrix = matrix.reconcile(&reference);
    }

    let matrix = matrix.exclude(&excluded)?;
    matrix.write_gz(&request.output, request.gzip_level)?;

    let summary = CollateSummary {
        output: request.output.clone(),
        samples: request.inputs.len(),
        genes_counted,
        genes_excluded: excluded.len(),
        genes_written: matrix.n_genes(),
        columns_written: matrix.samples().len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Collation complete: {} genes x {} samples in {}ms",
        summary.genes_written, summary.columns_written, summary.duration_ms
    );
    Ok(summary)
}
