//! Result filtering runs for the expression and splicing modules.
//!
//! Every table is computed before the first file is written, so a failing stage
//! leaves the output directory untouched.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use dropkit_common::io::{write_json, write_table};
use dropkit_common::{DropkitError, JoinAudit, Result, SampleId, Table};
use serde::Serialize;
use tracing::{info, warn};

use crate::annotate::{annotate_with_symbols, load_gene_names};
use crate::loader::{load_expression_results, load_splicing_results};
use crate::panel::{filter_by_panel, GenePanel, PanelChoice};
use crate::store::open_store;
use crate::top_hits::{select_top_hits, SampleSelection};

/// Output label of the expression module.
pub const EXPRESSION_LABEL: &str = "OUTRIDER";
/// Output label of the splicing module.
pub const SPLICING_LABEL: &str = "FRASER";

/// Where result tables land.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    dir: PathBuf,
}

impl OutputLayout {
    /// Use `dir`, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| DropkitError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn top_hits(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}_provided_samples_top_hits.tsv"))
    }

    pub fn filtered(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}_provided_samples_top_hits_filtered.tsv"))
    }
}

/// The two expression inputs, which are only meaningful together.
#[derive(Debug, Clone)]
pub struct ExpressionInputs {
    /// Results store (delimited export of the expression tool's results).
    pub results: PathBuf,
    /// Gene id to gene name lookup written alongside the results.
    pub gene_names: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FilterRequest {
    pub samples: Vec<SampleId>,
    pub panel: PanelChoice,
    pub expression: Option<ExpressionInputs>,
    pub splicing: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Per-sample cutoff for the top-hit rule.
    pub top_hits: usize,
}

/// What one module wrote.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub label: String,
    pub cohort_rows: usize,
    pub top_hits_path: PathBuf,
    pub top_hits_rows: usize,
    pub filtered_path: Option<PathBuf>,
    pub filtered_rows: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selections: Vec<SampleSelection>,
    pub joins: Vec<JoinAudit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    pub samples: Vec<SampleId>,
    pub panel: String,
    pub modules: Vec<ModuleReport>,
    pub duration_ms: u64,
}

impl FilterReport {
    pub fn module(&self, label: &str) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.label == label)
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_json(self, path)
    }
}

/// A module's tables, held until every module has succeeded.
struct Staged {
    report: ModuleReport,
    top_hits: Table,
    filtered: Option<Table>,
}

/// Run every module the request has inputs for.
pub fn filter_results(request: &FilterRequest) -> Result<FilterReport> {
    let start = Instant::now();
    if request.expression.is_none() && request.splicing.is_none() {
        return Err(DropkitError::Usage(
            "no result inputs given; pass expression results with their gene names, splicing results, or both"
                .to_string(),
        ));
    }
    if request.top_hits == 0 {
        return Err(DropkitError::Usage("top-hit cutoff must be at least 1".to_string()));
    }
    let samples = unique_samples(&request.samples)?;

    let panel = match &request.panel {
        PanelChoice::NoPanel => {
            info!("No gene panel given; filtered tables will not be written");
            None
        }
        PanelChoice::Panel(path) => Some(GenePanel::load(path)?),
    };
    let layout = OutputLayout::create(&request.output_dir)?;

    let mut staged = Vec::new();
    if let Some(inputs) = &request.expression {
        staged.push(run_expression(inputs, &samples, request.top_hits, panel.as_ref(), &layout)?);
    }
    if let Some(path) = &request.splicing {
        staged.push(run_splicing(path, &samples, panel.as_ref(), &layout)?);
    }

    let mut modules = Vec::with_capacity(staged.len());
    for module in staged {
        write_table(&module.top_hits, &module.report.top_hits_path)?;
        if let (Some(table), Some(path)) = (&module.filtered, &module.report.filtered_path) {
            write_table(table, path)?;
        }
        info!(
            "{}: wrote {} rows to {:?}",
            module.report.label, module.report.top_hits_rows, module.report.top_hits_path
        );
        modules.push(module.report);
    }

    Ok(FilterReport {
        samples,
        panel: request.panel.to_string(),
        modules,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn unique_samples(samples: &[SampleId]) -> Result<Vec<SampleId>> {
    if samples.is_empty() {
        return Err(DropkitError::Usage("at least one sample is required".to_string()));
    }
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(samples.len());
    for sample in samples {
        if seen.insert(sample.clone()) {
            unique.push(sample.clone());
        } else {
            warn!("Sample {} given more than once; using it once", sample);
        }
    }
    Ok(unique)
}

fn run_expression(
    inputs: &ExpressionInputs,
    samples: &[SampleId],
    threshold: usize,
    panel: Option<&GenePanel>,
    layout: &OutputLayout,
) -> Result<Staged> {
    info!("{}: filtering {:?}", EXPRESSION_LABEL, inputs.results);
    let store = open_store(&inputs.results)?;
    let cohort = load_expression_results(store.as_ref(), samples)?;
    let hits = select_top_hits(&cohort, samples, threshold)?;

    let gene_names = load_gene_names(&inputs.gene_names)?;
    let annotated = annotate_with_symbols(&hits.table, &gene_names)?;

    let mut joins = vec![annotated.audit];
    let filtered = panel
        .map(|panel| filter_by_panel(&annotated.table, panel))
        .transpose()?
        .map(|f| {
            joins.push(f.audit);
            f.table
        });

    Ok(stage(EXPRESSION_LABEL, layout, cohort.len(), annotated.table, filtered, hits.selections, joins))
}

fn run_splicing(
    path: &Path,
    samples: &[SampleId],
    panel: Option<&GenePanel>,
    layout: &OutputLayout,
) -> Result<Staged> {
    info!("{}: filtering {:?}", SPLICING_LABEL, path);
    let cohort = load_splicing_results(path, samples)?;

    let mut joins = Vec::new();
    let filtered = panel
        .map(|panel| filter_by_panel(&cohort, panel))
        .transpose()?
        .map(|f| {
            joins.push(f.audit);
            f.table
        });

    let rows = cohort.len();
    Ok(stage(SPLICING_LABEL, layout, rows, cohort, filtered, Vec::new(), joins))
}

fn stage(
    label: &str,
    layout: &OutputLayout,
    cohort_rows: usize,
    top_hits: Table,
    filtered: Option<Table>,
    selections: Vec<SampleSelection>,
    joins: Vec<JoinAudit>,
) -> Staged {
    let report = ModuleReport {
        label: label.to_string(),
        cohort_rows,
        top_hits_path: layout.top_hits(label),
        top_hits_rows: top_hits.len(),
        filtered_path: filtered.as_ref().map(|_| layout.filtered(label)),
        filtered_rows: filtered.as_ref().map(Table::len),
        selections,
        joins,
    };
    Staged {
        report,
        top_hits,
        filtered,
    }
}
