use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DropkitError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Delimited file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error in {} at line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Missing column '{column}' in {context}")]
    MissingColumn { column: String, context: String },

    #[error("Sample '{sample}' does not share the gene universe of the first sample: gene '{gene}' {detail}")]
    GeneUniverseMismatch {
        sample: String,
        gene: String,
        detail: &'static str,
    },

    #[error("Cannot exclude gene '{0}': not present in the count matrix")]
    ExcludedGeneAbsent(String),

    #[error("Gene '{gene}' appears more than once in {}", path.display())]
    DuplicateGene { path: PathBuf, gene: String },

    #[error("Sample '{0}' was given more than once")]
    DuplicateSample(String),

    #[error("Result table error: {0}")]
    ResultTable(String),

    #[error("Unsupported input: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DropkitError>;

impl DropkitError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn missing_column(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            context: context.into(),
        }
    }

    /// True for failures caused by how the tool was invoked rather than by input content.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::Config(_))
    }
}
