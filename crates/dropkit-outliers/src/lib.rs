//! dropkit-outliers: Cohort filtering of expression and splicing outlier results.
//!
//! Expression: load -> per-sample top hits -> gene symbol annotation -> panel filter.
//! Splicing: load -> panel filter (rows arrive already annotated).

pub mod annotate;
pub mod columns;
pub mod loader;
pub mod panel;
pub mod pipeline;
pub mod store;
pub mod top_hits;

pub use annotate::{annotate_with_symbols, load_gene_names, Annotated};
pub use loader::{load_expression_results, load_splicing_results};
pub use panel::{filter_by_panel, GenePanel, GenePanelEntry, PanelChoice, PanelFiltered};
pub use pipeline::{filter_results, ExpressionInputs, FilterReport, FilterRequest, ModuleReport, OutputLayout};
pub use store::{open_store, DelimitedStore, InMemoryStore, NamedTable, ResultStore};
pub use top_hits::{select_top_hits, SampleSelection, SelectionRule, TopHits};
