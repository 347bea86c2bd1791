//! Column names fixed by the upstream outlier tools and the gene panel format.

pub const SAMPLE_ID: &str = "sampleID";
pub const GENE_ID: &str = "geneID";
pub const P_VALUE: &str = "pValue";
pub const ABERRANT: &str = "aberrant";

/// Gene symbol column carried by annotated results.
pub const SYMBOL: &str = "hgncSymbol";

/// Gene name lookup written next to the expression results.
pub const LOOKUP_GENE_ID: &str = "gene_id";
pub const LOOKUP_GENE_NAME: &str = "gene_name";

pub const PANEL_SYMBOL: &str = "hgnc_symbol";
pub const PANEL_HGNC_ID: &str = "hgnc_id";
