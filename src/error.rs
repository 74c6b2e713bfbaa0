use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    #[error("Workbook read error: {0}")]
    WorkbookRead(#[from] calamine::Error),

    #[cfg(feature = "xlsx")]
    #[error("Workbook write error: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Unsupported input file: {0}")]
    UnsupportedInput(String),

    #[error("Unknown comparison mode: {0}")]
    UnknownMode(String),

    #[error("Unknown month: {0}")]
    UnknownMonth(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Recoverable outcome of a report stage. A failure never aborts the
/// process; it carries the message shown to the user in place of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Selection cardinality or configuration constraints were violated.
    Validation(String),
    /// Inputs were individually valid but no rows survived filtering.
    Empty(String),
    /// A column the report depends on is missing from the record set.
    Schema(String),
}

impl Failure {
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::Empty(m) | Self::Schema(m) => m,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Empty(_) => "empty",
            Self::Schema(_) => "schema",
        }
    }

    /// Emit the failure at the level its kind deserves. Schema problems point
    /// at an upstream data-contract violation and are logged as errors.
    pub fn log(&self, stage: &str) {
        match self {
            Self::Schema(m) => tracing::error!(stage, kind = self.kind(), "{m}"),
            _ => tracing::warn!(stage, kind = self.kind(), "{}", self.message()),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Failure {}
