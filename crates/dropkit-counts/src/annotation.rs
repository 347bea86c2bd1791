//! Exclusion set of genes annotated outside the standard reference chromosomes.

use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::Path;

use dropkit_common::io::open_reader;
use dropkit_common::{DropkitError, GeneId, Result};
use regex::Regex;
use tracing::{debug, info};

/// Primary assembly chromosomes. Genes on any other sequence (alt contigs, patches,
/// unplaced scaffolds) are excluded from the count matrix.
pub const STANDARD_CHROMOSOMES: [&str; 25] = [
    "chr1", "chr2", "chr3", "chr4", "chr5", "chr6", "chr7", "chr8", "chr9", "chr10", "chr11",
    "chr12", "chr13", "chr14", "chr15", "chr16", "chr17", "chr18", "chr19", "chr20", "chr21",
    "chr22", "chrX", "chrY", "chrM",
];

pub fn is_standard_chromosome(name: &str) -> bool {
    STANDARD_CHROMOSOMES.contains(&name)
}

fn gene_id_regex() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"gene_id "(.+?)""#).unwrap())
}

/// Gene ids to drop from the count matrix. Built once per run and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    genes: BTreeSet<GeneId>,
}

impl ExclusionSet {
    pub fn contains(&self, gene: &str) -> bool {
        self.genes.contains(gene)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Gene ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &GeneId> {
        self.genes.iter()
    }
}

impl FromIterator<GeneId> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = GeneId>>(iter: I) -> Self {
        Self {
            genes: iter.into_iter().collect(),
        }
    }
}

/// Scan a GTF annotation and collect the gene id of every line whose sequence name is
/// not a standard chromosome.
///
/// A gene is excluded as soon as any one of its lines sits on a non-standard sequence,
/// even when other lines of the same gene are on a standard chromosome.
pub fn load_exclusion_set(path: &Path) -> Result<ExclusionSet> {
    let reader = open_reader(path)?;
    let mut genes = BTreeSet::new();
    let mut scanned = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DropkitError::io(path, e))?;
        if line.starts_with('#') {
            continue;
        }
        let Some(chrom) = line.split_whitespace().next() else {
            continue;
        };
        scanned += 1;
        if is_standard_chromosome(chrom) {
            continue;
        }

        let gene_id = gene_id_regex()
            .captures(&line)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| {
                DropkitError::parse(
                    path,
                    idx + 1,
                    format!("no gene_id attribute on a line for sequence '{chrom}'"),
                )
            })?;
        if genes.insert(GeneId::new(gene_id.as_str())) {
            debug!("Excluding {} (on {})", gene_id.as_str(), chrom);
        }
    }

    info!(
        "Annotation {:?}: {} feature lines, {} genes outside standard chromosomes",
        path,
        scanned,
        genes.len()
    );
    Ok(ExclusionSet { genes })
}
