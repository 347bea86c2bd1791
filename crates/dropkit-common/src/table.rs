//! Header-addressed table of text cells.
//!
//! Result files from the outlier tools carry many tool-specific columns that this crate
//! never interprets. Rows are kept as text and written back verbatim; only the handful
//! of columns a stage needs are looked up by name.
//!
//! Every operation borrows its input and returns a new table, so intermediate stages
//! stay inspectable.

use std::collections::{HashMap, HashSet};

use crate::error::{DropkitError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from string slices. Mostly useful in tests and fixtures.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let mut table = Self::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|c| c.to_string()).collect())?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DropkitError::ResultTable(format!(
                "row has {} cells but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str, context: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DropkitError::missing_column(name, context))
    }

    pub fn require_columns(&self, names: &[&str], context: &str) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| self.require_column(name, context))
            .collect()
    }

    /// Cell values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &str> + '_> {
        let idx = self.require_column(name, "table")?;
        Ok(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// New table with the rows for which `keep` returns true, in original order.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[String]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row))
                .cloned()
                .collect(),
        }
    }

    /// Rows whose `column` value is in `allowed`.
    pub fn filter_in<S: AsRef<str>>(&self, column: &str, allowed: &[S]) -> Result<Table> {
        let idx = self.require_column(column, "table")?;
        let allowed: HashSet<&str> = allowed.iter().map(AsRef::as_ref).collect();
        Ok(self.filter_rows(|row| allowed.contains(row[idx].as_str())))
    }

    /// New table made of the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Append the rows of `other`. Both tables must have identical columns.
    pub fn extend(&mut self, other: Table) -> Result<()> {
        if other.columns != self.columns {
            return Err(DropkitError::ResultTable(format!(
                "cannot concatenate tables with different columns: {:?} vs {:?}",
                self.columns, other.columns
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub fn rename_column(&self, from: &str, to: &str) -> Table {
        let mut renamed = self.clone();
        for column in renamed.columns.iter_mut().filter(|c| c.as_str() == from) {
            *column = to.to_string();
        }
        renamed
    }

    pub fn drop_column(&self, name: &str) -> Result<Table> {
        let idx = self.require_column(name, "table")?;
        let mut columns = self.columns.clone();
        columns.remove(idx);
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.remove(idx);
                row
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// Inner join driven by `rows`: for every row of `rows`, in order, emit one output
    /// row per matching row of `self` (matched on `self[key] == rows[rows_key]`).
    ///
    /// Output columns are `self`'s columns followed by `rows`' columns. When both key
    /// columns share a name only one copy is kept. Other name clashes get `_x` on the
    /// `self` side and `_y` on the `rows` side.
    pub fn lookup_join(&self, key: &str, rows: &Table, rows_key: &str) -> Result<Table> {
        let key_idx = self.require_column(key, "lookup table")?;
        let rows_key_idx = rows.require_column(rows_key, "joined rows")?;
        let shared_key = key == rows_key;

        let right_kept: Vec<usize> = (0..rows.columns.len())
            .filter(|&i| !(shared_key && i == rows_key_idx))
            .collect();
        let right_names: HashSet<&str> = right_kept
            .iter()
            .map(|&i| rows.columns[i].as_str())
            .collect();
        let left_names: HashSet<&str> = self
            .columns
            .iter()
            .enumerate()
            .filter(|&(i, _)| !(shared_key && i == key_idx))
            .map(|(_, c)| c.as_str())
            .collect();

        let mut columns = Vec::with_capacity(self.columns.len() + right_kept.len());
        for (i, column) in self.columns.iter().enumerate() {
            let clashes = !(shared_key && i == key_idx) && right_names.contains(column.as_str());
            columns.push(if clashes {
                format!("{column}_x")
            } else {
                column.clone()
            });
        }
        for &i in &right_kept {
            let column = &rows.columns[i];
            columns.push(if left_names.contains(column.as_str()) {
                format!("{column}_y")
            } else {
                column.clone()
            });
        }

        let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            index.entry(row[key_idx].as_str()).or_default().push(i);
        }

        let mut joined = Table::new(columns);
        for row in &rows.rows {
            let Some(matches) = index.get(row[rows_key_idx].as_str()) else {
                continue;
            };
            for &m in matches {
                let mut out = self.rows[m].clone();
                out.extend(right_kept.iter().map(|&i| row[i].clone()));
                joined.rows.push(out);
            }
        }
        Ok(joined)
    }
}
