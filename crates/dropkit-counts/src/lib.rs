//! dropkit-counts: Collate per-sample aligner gene counts into one count matrix.
//!
//! Stages: annotation exclusion set, per-sample count reading, matrix assembly,
//! optional reconciliation with a reference matrix, strict exclusion, gzip TSV output.

pub mod annotation;
pub mod matrix;
pub mod pipeline;
pub mod star;

pub use annotation::{load_exclusion_set, ExclusionSet, STANDARD_CHROMOSOMES};
pub use matrix::CountMatrix;
pub use pipeline::{collate_counts, CollateRequest, CollateSummary, SampleInput};
pub use star::{read_gene_counts, CountMapping, Strandedness};
