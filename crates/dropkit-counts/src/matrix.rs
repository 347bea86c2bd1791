//! Gene x sample count matrix.
//!
//! Rows are kept in gene-id order. A cell is `None` when the gene was never counted for
//! that sample, which only happens after reconciliation with a reference matrix. Absent
//! cells are written as empty fields, never as zero.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;

use dropkit_common::io::{read_table, write_atomic, Compression};
use dropkit_common::{DropkitError, GeneId, Result, SampleId};
use tracing::{debug, info};

use crate::annotation::ExclusionSet;
use crate::star::CountMapping;

/// Header of the row-key column.
pub const INDEX_NAME: &str = "geneID";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountMatrix {
    samples: Vec<SampleId>,
    rows: BTreeMap<GeneId, Vec<Option<u64>>>,
}

impl CountMatrix {
    /// Assemble a matrix from per-sample mappings. Columns follow input order; rows are
    /// the gene universe of the first sample, which every other sample must share.
    pub fn from_mappings(mappings: &[CountMapping]) -> Result<Self> {
        let Some(first) = mappings.first() else {
            return Err(DropkitError::Usage("no samples to collate".to_string()));
        };

        let mut seen = HashSet::new();
        for mapping in mappings {
            if !seen.insert(mapping.sample()) {
                return Err(DropkitError::DuplicateSample(mapping.sample().to_string()));
            }
        }
        for mapping in &mappings[1..] {
            check_same_universe(first, mapping)?;
        }

        let samples: Vec<SampleId> = mappings.iter().map(|m| m.sample().clone()).collect();
        let rows = first
            .counts()
            .keys()
            .map(|gene| {
                let values: Vec<Option<u64>> = mappings.iter().map(|m| m.get(gene.as_str())).collect();
                (gene.clone(), values)
            })
            .collect();

        Ok(Self { samples, rows })
    }

    pub fn samples(&self) -> &[SampleId] {
        &self.samples
    }

    /// Gene ids in row order.
    pub fn genes(&self) -> impl Iterator<Item = &GeneId> {
        self.rows.keys()
    }

    pub fn n_genes(&self) -> usize {
        self.rows.len()
    }

    pub fn contains_gene(&self, gene: &str) -> bool {
        self.rows.contains_key(gene)
    }

    pub fn get(&self, gene: &str, sample: &str) -> Option<u64> {
        let col = self.samples.iter().position(|s| s.as_str() == sample)?;
        self.rows.get(gene).and_then(|values| values[col])
    }

    /// Merge with a previously built reference matrix.
    ///
    /// The result holds the union of genes. Columns are this matrix's samples followed by
    /// reference-only samples. Each cell takes this matrix's value when present and the
    /// reference value otherwise, so new-sample cells stay absent for reference-only genes.
    pub fn reconcile(&self, reference: &CountMatrix) -> CountMatrix {
        let mut samples = self.samples.clone();
        let ref_only: Vec<&SampleId> = reference
            .samples
            .iter()
            .filter(|s| !self.samples.contains(s))
            .collect();
        samples.extend(ref_only.iter().map(|s| (*s).clone()));

        let ref_columns: Vec<Option<usize>> = samples
            .iter()
            .map(|s| reference.samples.iter().position(|r| r == s))
            .collect();

        let genes: Vec<&GeneId> = {
            let mut genes: Vec<&GeneId> = self.rows.keys().chain(reference.rows.keys()).collect();
            genes.sort();
            genes.dedup();
            genes
        };

        let mut rows: BTreeMap<GeneId, Vec<Option<u64>>> = BTreeMap::new();
        let mut ref_only_genes = 0usize;
        for gene in genes {
            let own = self.rows.get(gene);
            let theirs = reference.rows.get(gene);
            if own.is_none() {
                ref_only_genes += 1;
            }
            let values: Vec<Option<u64>> = (0..samples.len())
                .map(|col| {
                    let own_value = own.and_then(|v| v.get(col).copied().flatten());
                    let ref_value = match (theirs, ref_columns[col]) {
                        (Some(v), Some(rc)) => v[rc],
                        _ => None,
                    };
                    own_value.or(ref_value)
                })
                .collect();
            rows.insert(gene.clone(), values);
        }

        info!(
            "Reconciled with reference: {} reference-only genes, {} reference-only samples, {} genes total",
            ref_only_genes,
            ref_only.len(),
            rows.len()
        );
        CountMatrix { samples, rows }
    }

    /// Drop every excluded gene. Each excluded gene must be present in the matrix.
    pub fn exclude(&self, excluded: &ExclusionSet) -> Result<CountMatrix> {
        if let Some(absent) = excluded.iter().find(|g| !self.rows.contains_key(*g)) {
            return Err(DropkitError::ExcludedGeneAbsent(absent.to_string()));
        }
        let rows: BTreeMap<GeneId, Vec<Option<u64>>> = self
            .rows
            .iter()
            .filter(|(gene, _)| !excluded.contains(gene.as_str()))
            .map(|(gene, values)| (gene.clone(), values.clone()))
            .collect();

        info!(
            "Excluded {} genes, {} remain",
            self.rows.len() - rows.len(),
            rows.len()
        );
        Ok(CountMatrix {
            samples: self.samples.clone(),
            rows,
        })
    }

    /// Write as gzip-compressed TSV with a header row and the gene id as first column.
    pub fn write_gz(&self, path: &Path, level: u32) -> Result<()> {
        write_atomic(path, Compression::Gzip(level), |out| self.write_tsv(path, out))?;
        info!(
            "Wrote {} genes x {} samples to {:?}",
            self.rows.len(),
            self.samples.len(),
            path
        );
        Ok(())
    }

    fn write_tsv(&self, path: &Path, out: &mut dyn Write) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
        let header = std::iter::once(INDEX_NAME).chain(self.samples.iter().map(SampleId::as_str));
        writer.write_record(header)?;

        let mut record = Vec::with_capacity(self.samples.len() + 1);
        for (gene, values) in &self.rows {
            record.clear();
            record.push(gene.to_string());
            record.extend(values.iter().map(|v| v.map(|c| c.to_string()).unwrap_or_default()));
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|e| DropkitError::io(path, e))?;
        Ok(())
    }

    /// Read a matrix written by [`CountMatrix::write_gz`] or an equivalent plain TSV.
    ///
    /// Integral float spellings (`12.0`) are accepted; empty and `NA` cells are absent.
    pub fn read(path: &Path) -> Result<CountMatrix> {
        let table = read_table(path, b'\t')?;
        let Some((_, sample_names)) = table.columns().split_first() else {
            return Err(DropkitError::parse(path, 1, "empty header"));
        };
        let samples: Vec<SampleId> = sample_names.iter().map(|s| SampleId::new(s.as_str())).collect();

        let mut rows = BTreeMap::new();
        for (idx, row) in table.rows().iter().enumerate() {
            let line = idx + 2;
            let values = row[1..]
                .iter()
                .map(|cell| parse_count_cell(cell).ok_or_else(|| {
                    DropkitError::parse(path, line, format!("'{cell}' is not a count"))
                }))
                .collect::<Result<Vec<_>>>()?;
            if rows.insert(GeneId::new(row[0].as_str()), values).is_some() {
                return Err(DropkitError::DuplicateGene {
                    path: path.to_path_buf(),
                    gene: row[0].clone(),
                });
            }
        }

        debug!(
            "Read matrix {:?}: {} genes x {} samples",
            path,
            rows.len(),
            samples.len()
        );
        Ok(CountMatrix { samples, rows })
    }
}

/// `Some(None)` for an absent cell, `Some(Some(n))` for a count, `None` if unparseable.
fn parse_count_cell(cell: &str) -> Option<Option<u64>> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    if let Ok(value) = cell.parse::<u64>() {
        return Some(Some(value));
    }
    match cell.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 => {
            Some(Some(value as u64))
        }
        _ => None,
    }
}

fn check_same_universe(first: &CountMapping, other: &CountMapping) -> Result<()> {
    if let Some(gene) = first.counts().keys().find(|g| !other.counts().contains_key(*g)) {
        return Err(DropkitError::GeneUniverseMismatch {
            sample: other.sample().to_string(),
            gene: gene.to_string(),
            detail: "is missing",
        });
    }
    if let Some(gene) = other.counts().keys().find(|g| !first.counts().contains_key(*g)) {
        return Err(DropkitError::GeneUniverseMismatch {
            sample: other.sample().to_string(),
            gene: gene.to_string(),
            detail: "is not counted for the first sample",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropkit_test_utils::{read_gz, Fixture};
    use pretty_assertions::assert_eq;

    fn mapping(sample: &str, counts: &[(&str, u64)]) -> CountMapping {
        CountMapping::new(
            SampleId::new(sample),
            counts.iter().map(|(g, c)| (GeneId::new(*g), *c)).collect(),
        )
    }

    fn exclusion(genes: &[&str]) -> ExclusionSet {
        genes.iter().map(|g| GeneId::new(*g)).collect()
    }

    #[test]
    fn test_columns_follow_input_order() {
        let matrix = CountMatrix::from_mappings(&[
            mapping("B", &[("g1", 1), ("g2", 2)]),
            mapping("A", &[("g1", 3), ("g2", 4)]),
        ])
        .unwrap();

        let samples: Vec<&str> = matrix.samples().iter().map(SampleId::as_str).collect();
        assert_eq!(samples, vec!["B", "A"]);
        assert_eq!(matrix.get("g2", "A"), Some(4));
        assert_eq!(matrix.get("g1", "B"), Some(1));
    }

    #[test]
    fn test_universe_mismatch_names_the_gene() {
        let err = CountMatrix::from_mappings(&[
            mapping("A", &[("g1", 1), ("g2", 2)]),
            mapping("B", &[("g1", 3)]),
        ])
        .unwrap_err();
        match err {
            DropkitError::GeneUniverseMismatch { sample, gene, .. } => {
                assert_eq!(sample, "B");
                assert_eq!(gene, "g2");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = CountMatrix::from_mappings(&[
            mapping("A", &[("g1", 1)]),
            mapping("B", &[("g1", 3), ("g9", 1)]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("g9"));
    }

    #[test]
    fn test_duplicate_sample_rejected() {
        let err = CountMatrix::from_mappings(&[mapping("A", &[("g1", 1)]), mapping("A", &[("g1", 1)])])
            .unwrap_err();
        assert!(matches!(err, DropkitError::DuplicateSample(ref s) if s == "A"));
    }

    #[test]
    fn test_exclusion_is_total_and_strict() {
        let matrix = CountMatrix::from_mappings(&[mapping("A", &[("g1", 1), ("g2", 2), ("g3", 3)])]).unwrap();

        let kept = matrix.exclude(&exclusion(&["g3"])).unwrap();
        let genes: Vec<&str> = kept.genes().map(GeneId::as_str).collect();
        assert_eq!(genes, vec!["g1", "g2"]);

        let err = kept.exclude(&exclusion(&["g3"])).unwrap_err();
        assert!(matches!(err, DropkitError::ExcludedGeneAbsent(ref g) if g == "g3"));

        let untouched = kept.exclude(&ExclusionSet::default()).unwrap();
        assert_eq!(untouched, kept);
    }

    #[test]
    fn test_reconcile_keeps_union_and_leaves_new_cells_absent() {
        let new = CountMatrix::from_mappings(&[
            mapping("A", &[("g1", 10), ("g2", 20)]),
            mapping("B", &[("g1", 11), ("g2", 21)]),
        ])
        .unwrap();
        let reference = CountMatrix::from_mappings(&[
            mapping("B", &[("g1", 99), ("g4", 98)]),
            mapping("R1", &[("g1", 5), ("g4", 6)]),
        ])
        .unwrap();

        let merged = new.reconcile(&reference);

        let samples: Vec<&str> = merged.samples().iter().map(SampleId::as_str).collect();
        assert_eq!(samples, vec!["A", "B", "R1"]);
        let genes: Vec<&str> = merged.genes().map(GeneId::as_str).collect();
        assert_eq!(genes, vec!["g1", "g2", "g4"]);

        // New values win where both exist.
        assert_eq!(merged.get("g1", "B"), Some(11));
        // Reference-only gene: new-only sample stays absent, overlapping sample is filled.
        assert_eq!(merged.get("g4", "A"), None);
        assert_eq!(merged.get("g4", "B"), Some(98));
        assert_eq!(merged.get("g4", "R1"), Some(6));
        // New-only gene has no reference value.
        assert_eq!(merged.get("g2", "R1"), None);
    }

    #[test]
    fn test_write_then_read_reproduces_values() {
        let fx = Fixture::new();
        let path = fx.path("counts.tsv.gz");
        let matrix = CountMatrix::from_mappings(&[
            mapping("A", &[("g1", 0), ("g2", 7)]),
            mapping("B", &[("g1", 3), ("g2", 123456)]),
        ])
        .unwrap();

        matrix.write_gz(&path, 6).unwrap();

        assert_eq!(read_gz(&path), "geneID\tA\tB\ng1\t0\t3\ng2\t7\t123456\n");
        assert_eq!(CountMatrix::read(&path).unwrap(), matrix);
    }

    #[test]
    fn test_absent_cells_written_empty() {
        let fx = Fixture::new();
        let path = fx.path("counts.tsv.gz");
        let reference = CountMatrix::from_mappings(&[mapping("R", &[("g0", 4)])]).unwrap();
        let merged = CountMatrix::from_mappings(&[mapping("A", &[("g1", 1)])])
            .unwrap()
            .reconcile(&reference);

        merged.write_gz(&path, 1).unwrap();
        assert_eq!(read_gz(&path), "geneID\tA\tR\ng0\t\t4\ng1\t1\t\n");
    }

    #[test]
    fn test_reference_float_spellings() {
        let fx = Fixture::new();
        let path = fx.write("ref.tsv", "geneID\tR1\tR2\ng1\t12.0\tNA\ng2\t3\t\n");
        let reference = CountMatrix::read(&path).unwrap();
        assert_eq!(reference.get("g1", "R1"), Some(12));
        assert_eq!(reference.get("g1", "R2"), None);
        assert_eq!(reference.get("g2", "R2"), None);

        let bad = fx.write("bad.tsv", "geneID\tR1\ng1\t1.5\n");
        assert!(matches!(CountMatrix::read(&bad).unwrap_err(), DropkitError::Parse { line: 2, .. }));
    }
}
