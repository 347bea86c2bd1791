//! Fixture builders shared by the dropkit test suites.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

/// Scratch directory that is removed when dropped.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn write_gz(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        let mut encoder = GzEncoder::new(File::create(&path).expect("create fixture"), Compression::default());
        encoder.write_all(content.as_bytes()).expect("compress fixture");
        encoder.finish().expect("finish gzip");
        path
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).expect("read fixture output")
    }

    /// Names of all files in the fixture root, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.root())
            .expect("list fixture dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Decompress a gzip file to text.
pub fn read_gz(path: &Path) -> String {
    let mut text = String::new();
    MultiGzDecoder::new(File::open(path).expect("open gzip output"))
        .read_to_string(&mut text)
        .expect("decompress output");
    text
}

/// Aligner per-gene count file: the four summary rows followed by one line per gene
/// with (unstranded, forward, reverse) counts.
pub fn star_counts(genes: &[(&str, u64, u64, u64)]) -> String {
    let mut out = String::from(
        "N_unmapped\t11\t11\t11\nN_multimapping\t7\t7\t7\nN_noFeature\t5\t90\t88\nN_ambiguous\t3\t0\t1\n",
    );
    for (gene, unstranded, forward, reverse) in genes {
        out.push_str(&format!("{gene}\t{unstranded}\t{forward}\t{reverse}\n"));
    }
    out
}

/// One exon line of a GTF annotation.
pub fn gtf_line(chrom: &str, gene_id: &str) -> String {
    format!(
        "{chrom}\tHAVANA\texon\t11869\t12227\t.\t+\t.\tgene_id \"{gene_id}\"; transcript_id \"{gene_id}-T1\"; gene_type \"protein_coding\";\n"
    )
}

/// One expression outlier call.
#[derive(Debug, Clone)]
pub struct ExpressionRow {
    pub sample: String,
    pub gene: String,
    pub p_value: String,
    pub aberrant: bool,
}

impl ExpressionRow {
    pub fn new(sample: &str, gene: &str, p_value: f64, aberrant: bool) -> Self {
        Self {
            sample: sample.to_string(),
            gene: gene.to_string(),
            p_value: format!("{p_value:e}"),
            aberrant,
        }
    }
}

/// Tab-separated export of an expression results table.
pub fn expression_tsv(rows: &[ExpressionRow]) -> String {
    let mut out = String::from("geneID\tsampleID\tpValue\tpadjust\tzScore\taberrant\n");
    for row in rows {
        out.push_str(&format!(
            "{}\t{}\t{}\t1\t-2.5\t{}\n",
            row.gene,
            row.sample,
            row.p_value,
            if row.aberrant { "TRUE" } else { "FALSE" }
        ));
    }
    out
}
