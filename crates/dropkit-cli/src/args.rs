//! Command-line arguments of both entry points.
//!
//! Long flags keep the underscore spelling the surrounding workflow already passes.
//! Optional paths also accept the literal `None`, which the workflow uses for "absent".

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser};
use dropkit_common::SampleId;
use dropkit_config::Config;
use dropkit_counts::{CollateRequest, SampleInput, Strandedness};
use dropkit_outliers::{ExpressionInputs, FilterRequest, PanelChoice};

/// Version string reported by both binaries.
pub const VERSION: &str = "v1.0";

/// Value that stands for an absent optional path.
pub const ABSENT: &str = "None";

fn present(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.as_ref().filter(|p| p.as_os_str() != ABSENT).cloned()
}

fn sample_ids(samples: &[String]) -> Vec<SampleId> {
    samples.iter().map(|s| SampleId::new(s.as_str())).collect()
}

/// Options shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// TOML configuration file (defaults to $DROPKIT_CONFIG when set)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory; overrides `output.dir` from the configuration
    #[arg(long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Write a JSON report of the run (row counts, join losses, selections)
    #[arg(long, value_name = "FILE")]
    pub audit: Option<PathBuf>,
}

impl CommonArgs {
    pub fn output_dir(&self, config: &Config) -> PathBuf {
        self.outdir.clone().unwrap_or_else(|| config.output.dir.clone())
    }
}

// ── drop-counts ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Parser)]
#[command(name = "drop-counts")]
#[command(about = "Collate per-sample aligner gene counts into one compressed count matrix", long_about = None)]
#[command(version = VERSION)]
pub struct CountsArgs {
    /// Aligner per-gene count files (*ReadsPerGene.out.tab), one per sample
    #[arg(long, value_name = "FILE", num_args = 1.., required = true)]
    pub star: Vec<PathBuf>,

    /// Sample ids, in the same order as --star
    #[arg(long, value_name = "ID", num_args = 1.., required = true)]
    pub samples: Vec<String>,

    /// Library strandedness per sample: unstranded, forward or reverse
    #[arg(long, value_name = "MODE", num_args = 1.., required = true)]
    pub strandedness: Vec<Strandedness>,

    /// Output matrix (gzip); relative paths land in the output directory
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    /// Transcript annotation in GTF format
    #[arg(long, value_name = "FILE")]
    pub gtf: PathBuf,

    /// Existing count matrix to merge in, or None
    #[arg(long = "ref_count_file", value_name = "FILE")]
    pub ref_count_file: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl CountsArgs {
    /// Checks clap cannot express: the three per-sample lists must line up.
    pub fn validate(&self) -> Result<(), clap::Error> {
        let (star, samples, strands) = (self.star.len(), self.samples.len(), self.strandedness.len());
        if star != samples || strands != samples {
            return Err(Self::command().error(
                ErrorKind::WrongNumberOfValues,
                format!(
                    "--star, --samples and --strandedness need one value per sample \
                     (got {star}, {samples} and {strands})"
                ),
            ));
        }
        Ok(())
    }

    pub fn to_request(&self, config: &Config) -> CollateRequest {
        let inputs = self
            .star
            .iter()
            .zip(sample_ids(&self.samples))
            .zip(&self.strandedness)
            .map(|((counts_path, sample), &strandedness)| SampleInput {
                sample,
                counts_path: counts_path.clone(),
                strandedness,
            })
            .collect();

        CollateRequest {
            inputs,
            annotation: self.gtf.clone(),
            reference: present(&self.ref_count_file),
            output: self.common.output_dir(config).join(&self.output),
            gzip_level: config.output.gzip_level,
        }
    }
}

// ── drop-filter-results ────────────────────────────────────────────────────

#[derive(Debug, Clone, Parser)]
#[command(name = "drop-filter-results")]
#[command(
    about = "Keep the cohort's expression and splicing outliers, optionally restricted to a gene panel",
    long_about = None
)]
#[command(version = VERSION)]
pub struct FilterArgs {
    /// Sample ids of the cohort
    #[arg(long, value_name = "ID", num_args = 1.., required = true)]
    pub samples: Vec<String>,

    /// Gene panel (5 tab-separated columns), or None
    #[arg(long = "gene_panel", value_name = "FILE", default_value = ABSENT)]
    pub gene_panel: PanelChoice,

    /// Expression outlier results, exported as TSV or CSV
    #[arg(long = "drop_ae_rds", value_name = "FILE")]
    pub drop_ae_rds: Option<PathBuf>,

    /// Gene id to gene name table written by the expression module
    #[arg(long = "out_drop_gene_name", value_name = "FILE")]
    pub out_drop_gene_name: Option<PathBuf>,

    /// Splicing outlier results TSV
    #[arg(long = "out_drop_as_tsv", value_name = "FILE")]
    pub out_drop_as_tsv: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl FilterArgs {
    pub fn validate(&self) -> Result<(), clap::Error> {
        let results = present(&self.drop_ae_rds);
        let gene_names = present(&self.out_drop_gene_name);
        let splicing = present(&self.out_drop_as_tsv);

        match (&results, &gene_names) {
            (Some(_), None) | (None, Some(_)) => Err(Self::command().error(
                ErrorKind::MissingRequiredArgument,
                "--drop_ae_rds and --out_drop_gene_name must be given together",
            )),
            (None, None) if splicing.is_none() => Err(Self::command().error(
                ErrorKind::MissingRequiredArgument,
                "nothing to filter: give --drop_ae_rds with --out_drop_gene_name, --out_drop_as_tsv, or both",
            )),
            _ => Ok(()),
        }
    }

    pub fn to_request(&self, config: &Config) -> FilterRequest {
        let expression = match (present(&self.drop_ae_rds), present(&self.out_drop_gene_name)) {
            (Some(results), Some(gene_names)) => Some(ExpressionInputs { results, gene_names }),
            _ => None,
        };

        FilterRequest {
            samples: sample_ids(&self.samples),
            panel: self.gene_panel.clone(),
            expression,
            splicing: present(&self.out_drop_as_tsv),
            output_dir: self.common.output_dir(config),
            top_hits: config.selection.top_hits,
        }
    }
}
