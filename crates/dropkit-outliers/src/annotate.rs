//! Gene symbol annotation of expression top hits.

use std::path::Path;

use dropkit_common::io::read_table;
use dropkit_common::{JoinAudit, Result, Table};

use crate::columns::{GENE_ID, LOOKUP_GENE_ID, LOOKUP_GENE_NAME, SYMBOL};

/// Rows after annotation plus how many survived the join.
#[derive(Debug, Clone)]
pub struct Annotated {
    pub table: Table,
    pub audit: JoinAudit,
}

/// Field delimiter of the gene name lookup. The expression tool writes it comma-separated
/// whatever its file name says.
pub const GENE_NAMES_DELIMITER: u8 = b',';

/// Read the gene id to gene name lookup and rename `gene_name` to the symbol column.
pub fn load_gene_names(path: &Path) -> Result<Table> {
    let table = read_table(path, GENE_NAMES_DELIMITER)?;
    let origin = path.display().to_string();
    table.require_columns(&[LOOKUP_GENE_ID, LOOKUP_GENE_NAME], &origin)?;
    Ok(table.rename_column(LOOKUP_GENE_NAME, SYMBOL))
}

/// Inner join of `gene_names` onto `hits` by gene id. Hits with unknown ids are dropped
/// and counted in the audit.
pub fn annotate_with_symbols(hits: &Table, gene_names: &Table) -> Result<Annotated> {
    let table = gene_names.lookup_join(LOOKUP_GENE_ID, hits, GENE_ID)?;
    let audit = JoinAudit::new("gene annotation", hits.len(), table.len());
    audit.log();
    Ok(Annotated { table, audit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropkit_test_utils::Fixture;
    use pretty_assertions::assert_eq;

    fn hits() -> Table {
        Table::from_rows(
            &["geneID", "sampleID", "pValue", "aberrant"],
            &[
                &["ENSG2", "S1", "1e-8", "TRUE"],
                &["ENSG9", "S1", "1e-5", "FALSE"],
                &["ENSG1", "S2", "0.01", "FALSE"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_renamed_and_joined_in_hit_order() {
        let fx = Fixture::new();
        let path = fx.write(
            "gene_name_mapping.csv",
            "gene_id,gene_name,gene_type\nENSG1,TTN,protein_coding\nENSG2,DMD,protein_coding\n",
        );
        let names = load_gene_names(&path).unwrap();
        assert_eq!(names.columns(), &["gene_id", "hgncSymbol", "gene_type"]);

        let annotated = annotate_with_symbols(&hits(), &names).unwrap();

        assert_eq!(
            annotated.table.columns(),
            &["gene_id", "hgncSymbol", "gene_type", "geneID", "sampleID", "pValue", "aberrant"]
        );
        let symbols: Vec<&str> = annotated.table.column("hgncSymbol").unwrap().collect();
        assert_eq!(symbols, vec!["DMD", "TTN"]);
        assert_eq!(annotated.audit, JoinAudit::new("gene annotation", 3, 2));
        assert_eq!(annotated.audit.dropped(), 1);
    }

    #[test]
    fn test_lookup_is_comma_separated_even_when_named_tsv() {
        let fx = Fixture::new();
        let path = fx.write(
            "gene_name_mapping_v38.tsv",
            "gene_id,gene_name,gene_type\nENSG1,TTN,protein_coding\n",
        );

        let names = load_gene_names(&path).unwrap();

        assert_eq!(names.columns(), &["gene_id", "hgncSymbol", "gene_type"]);
        assert_eq!(names.rows(), &[vec!["ENSG1", "TTN", "protein_coding"]]);
    }

    #[test]
    fn test_lookup_without_gene_name_is_rejected() {
        let fx = Fixture::new();
        let path = fx.write("names.csv", "gene_id,symbol\nENSG1,TTN\n");
        assert!(load_gene_names(&path).is_err());
    }
}
