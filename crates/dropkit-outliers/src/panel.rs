//! Clinician gene panels and the panel filter.

use std::collections::HashSet;
use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dropkit_common::io::open_reader;
use dropkit_common::{DropkitError, JoinAudit, Result, Table};
use tracing::{debug, info};

use crate::columns::{PANEL_HGNC_ID, PANEL_SYMBOL, SYMBOL};

/// Fields of a panel line, in file order. Panel files carry no header.
pub const PANEL_COLUMNS: [&str; 5] = ["chromosome", "gene_start", "gene_stop", PANEL_HGNC_ID, PANEL_SYMBOL];

/// Argument value meaning "no panel supplied".
pub const NO_PANEL: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenePanelEntry {
    pub chromosome: String,
    pub gene_start: String,
    pub gene_stop: String,
    pub hgnc_id: String,
    pub hgnc_symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenePanel {
    entries: Vec<GenePanelEntry>,
}

impl GenePanel {
    /// Parse a tab-separated panel file. `#` lines and blank lines are skipped.
    /// Fields past the fifth are ignored; fewer than five is a parse error.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = open_reader(path)?;
        let mut entries = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| DropkitError::io(path, e))?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let [chromosome, gene_start, gene_stop, hgnc_id, hgnc_symbol, ref extra @ ..] = fields[..] else {
                return Err(DropkitError::parse(
                    path,
                    i + 1,
                    format!("expected {} tab-separated fields, found {}", PANEL_COLUMNS.len(), fields.len()),
                ));
            };
            if !extra.is_empty() {
                debug!("{:?} line {}: ignoring {} extra fields", path, i + 1, extra.len());
            }
            entries.push(GenePanelEntry {
                chromosome: chromosome.to_string(),
                gene_start: gene_start.to_string(),
                gene_stop: gene_stop.to_string(),
                hgnc_id: hgnc_id.to_string(),
                hgnc_symbol: hgnc_symbol.to_string(),
            });
        }

        info!("Loaded gene panel {:?} with {} entries", path, entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[GenePanelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hgnc_symbol, hgnc_id)` with one row per symbol; the first entry wins.
    fn symbol_lookup(&self) -> Result<Table> {
        let mut table = Table::new(vec![PANEL_SYMBOL.to_string(), PANEL_HGNC_ID.to_string()]);
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.hgnc_symbol.as_str()) {
                debug!("Panel symbol {} listed more than once", entry.hgnc_symbol);
                continue;
            }
            table.push_row(vec![entry.hgnc_symbol.clone(), entry.hgnc_id.clone()])?;
        }
        Ok(table)
    }
}

/// Gene panel argument: a path, or the `None` sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelChoice {
    NoPanel,
    Panel(PathBuf),
}

impl FromStr for PanelChoice {
    type Err = DropkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" => Err(DropkitError::Usage("gene panel argument is empty".to_string())),
            NO_PANEL => Ok(Self::NoPanel),
            path => Ok(Self::Panel(PathBuf::from(path))),
        }
    }
}

impl fmt::Display for PanelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPanel => f.write_str(NO_PANEL),
            Self::Panel(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelFiltered {
    pub table: Table,
    pub audit: JoinAudit,
}

/// Keep rows whose symbol is on the panel and attach the panel's HGNC id.
///
/// Output columns are `hgnc_id` followed by the input columns.
pub fn filter_by_panel(rows: &Table, panel: &GenePanel) -> Result<PanelFiltered> {
    rows.require_column(SYMBOL, "panel filter input")?;
    let lookup = panel.symbol_lookup()?;

    let symbols: Vec<&str> = lookup.column(PANEL_SYMBOL)?.collect();
    let restricted = rows.filter_in(SYMBOL, &symbols)?;

    let table = lookup
        .lookup_join(PANEL_SYMBOL, &restricted, SYMBOL)?
        .drop_column(PANEL_SYMBOL)?;

    let audit = JoinAudit::new("gene panel", rows.len(), table.len());
    audit.log();
    Ok(PanelFiltered { table, audit })
}
