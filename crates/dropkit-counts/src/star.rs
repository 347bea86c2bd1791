//! Reader for the aligner's per-gene count table (`ReadsPerGene.out.tab`).
//!
//! Layout: whitespace-separated `gene_id unstranded forward reverse`, preceded by
//! summary rows whose id starts with `N_` (unmapped, multimapping, noFeature, ambiguous).

use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use dropkit_common::io::open_reader;
use dropkit_common::{DropkitError, GeneId, Result, SampleId};
use serde::Serialize;
use tracing::{debug, info};

/// Prefix of the summary pseudo-genes written by the aligner.
pub const SUMMARY_PREFIX: &str = "N_";

/// Library strandedness; selects which count column is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strandedness {
    Unstranded,
    Forward,
    Reverse,
}

impl Strandedness {
    /// Zero-based column holding the counts for this mode (column 0 is the gene id).
    pub fn column(self) -> usize {
        match self {
            Strandedness::Unstranded => 1,
            Strandedness::Forward => 2,
            Strandedness::Reverse => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strandedness::Unstranded => "unstranded",
            Strandedness::Forward => "forward",
            Strandedness::Reverse => "reverse",
        }
    }
}

impl fmt::Display for Strandedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strandedness {
    type Err = DropkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unstranded" => Ok(Strandedness::Unstranded),
            "forward" => Ok(Strandedness::Forward),
            "reverse" => Ok(Strandedness::Reverse),
            other => Err(DropkitError::Usage(format!(
                "unknown strandedness '{other}' (expected unstranded, forward or reverse)"
            ))),
        }
    }
}

/// Counts of one sample, keyed and ordered by gene id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMapping {
    sample: SampleId,
    counts: BTreeMap<GeneId, u64>,
}

impl CountMapping {
    pub fn new(sample: SampleId, counts: BTreeMap<GeneId, u64>) -> Self {
        Self { sample, counts }
    }

    pub fn sample(&self) -> &SampleId {
        &self.sample
    }

    pub fn counts(&self) -> &BTreeMap<GeneId, u64> {
        &self.counts
    }

    pub fn get(&self, gene: &str) -> Option<u64> {
        self.counts.get(gene).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Read one sample's gene counts, taking the column selected by `strandedness`.
pub fn read_gene_counts(
    path: &Path,
    sample: SampleId,
    strandedness: Strandedness,
) -> Result<CountMapping> {
    let column = strandedness.column();
    let reader = open_reader(path)?;
    let mut counts = BTreeMap::new();
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DropkitError::io(path, e))?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(&gene) = fields.first() else {
            continue;
        };
        if gene.starts_with(SUMMARY_PREFIX) {
            skipped += 1;
            continue;
        }

        let raw = fields.get(column).ok_or_else(|| {
            DropkitError::parse(
                path,
                idx + 1,
                format!(
                    "expected at least {} columns for {} counts, found {}",
                    column + 1,
                    strandedness,
                    fields.len()
                ),
            )
        })?;
        let count: u64 = raw.parse().map_err(|_| {
            DropkitError::parse(
                path,
                idx + 1,
                format!("count '{raw}' for gene '{gene}' is not a non-negative integer"),
            )
        })?;

        if counts.insert(GeneId::new(gene), count).is_some() {
            return Err(DropkitError::DuplicateGene {
                path: path.to_path_buf(),
                gene: gene.to_string(),
            });
        }
    }

    debug!("Skipped {} summary rows in {:?}", skipped, path);
    info!(
        "Sample {}: {} genes from {:?} ({} counts)",
        sample,
        counts.len(),
        path,
        strandedness
    );
    Ok(CountMapping { sample, counts })
}
