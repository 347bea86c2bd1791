//! dropkit-common: Shared types, errors, and table I/O used across all dropkit crates.

pub mod audit;
pub mod error;
pub mod ids;
pub mod io;
pub mod table;

// Re-export commonly used types
pub use audit::JoinAudit;
pub use error::{DropkitError, Result};
pub use ids::{GeneId, SampleId};
pub use table::Table;
