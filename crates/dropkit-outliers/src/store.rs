//! Access to the expression tool's serialized results.
//!
//! The tool saves its results as a store of tables. Only the contract matters here:
//! a store yields named or unnamed tables, and the results are the single unnamed one.

use std::path::{Path, PathBuf};

use dropkit_common::io::{delimiter_for, read_table};
use dropkit_common::{DropkitError, Result, Table};

/// A table as found in a results store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedTable {
    pub name: Option<String>,
    pub table: Table,
}

/// Trait for reading tables out of a statistical results store.
pub trait ResultStore {
    /// Every top-level table in the store.
    fn tables(&self) -> Result<Vec<NamedTable>>;

    /// Human-readable origin, for logs and errors.
    fn describe(&self) -> String;
}

// ── Delimited export ───────────────────────────────────────────────────────

/// A store exported as one delimited text file (tab, or comma for `.csv`; gzip allowed).
/// It always holds exactly one unnamed table.
pub struct DelimitedStore {
    path: PathBuf,
}

impl DelimitedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultStore for DelimitedStore {
    fn tables(&self) -> Result<Vec<NamedTable>> {
        let table = read_table(&self.path, delimiter_for(&self.path))?;
        Ok(vec![NamedTable { name: None, table }])
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Pick the store implementation for `path`.
///
/// Native R serialisation is not parsed; such files must be exported to TSV first.
pub fn open_store(path: &Path) -> Result<Box<dyn ResultStore>> {
    let is_rds = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("rds"))
        .unwrap_or(false);
    if is_rds {
        return Err(DropkitError::Unsupported(format!(
            "{} is an R data file; export the results table to TSV \
             (e.g. data.table::fwrite(readRDS(path), sep = \"\\t\")) and pass that instead",
            path.display()
        )));
    }
    Ok(Box::new(DelimitedStore::new(path)))
}

// ── In-memory store for tests ──────────────────────────────────────────────

pub struct InMemoryStore {
    tables: Vec<NamedTable>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn with(mut self, name: Option<&str>, table: Table) -> Self {
        self.tables.push(NamedTable {
            name: name.map(str::to_string),
            table,
        });
        self
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore for InMemoryStore {
    fn tables(&self) -> Result<Vec<NamedTable>> {
        Ok(self.tables.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory store ({} tables)", self.tables.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropkit_test_utils::Fixture;

    #[test]
    fn test_rds_is_rejected_with_hint() {
        let err = open_store(Path::new("OUTRIDER_results_all.Rds")).err().unwrap();
        assert!(matches!(err, DropkitError::Unsupported(_)));
        assert!(err.to_string().contains("TSV"));
    }

    #[test]
    fn test_delimited_store_yields_one_unnamed_table() {
        let fx = Fixture::new();
        let path = fx.write("results.csv", "sampleID,geneID\nS1,ENSG1\n");
        let tables = open_store(&path).unwrap().tables().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, None);
        assert_eq!(tables[0].table.rows(), &[vec!["S1", "ENSG1"]]);
    }
}
