use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("required column `{0}` is missing")]
    MissingColumn(String),

    #[error("column `{column}` has unsupported type: {reason}")]
    ColumnType { column: String, reason: String },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("dataset load task failed: {0}")]
    Task(String),
}

impl AnalyticsError {
    /// Whether the error was caused by caller input rather than the data.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::InvalidFilter(_))
    }
}
