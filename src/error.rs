/// Unified error type for the tabular Q&A engine
/// Provides structured error handling with categories for different failure modes
use thiserror::Error;

/// Maximum number of available columns quoted back in a resolution failure.
pub const AVAILABLE_COLUMN_SAMPLE: usize = 10;

#[derive(Error, Debug, Clone)]
pub enum QaError {
    /// No dataset with the requested id is registered
    #[error("dataset '{dataset_id}' not found")]
    DatasetNotFound { dataset_id: String },

    /// No dataset has been loaded at all
    #[error("no dataset is currently loaded")]
    NoDatasetLoaded,

    /// Column phrase could not be resolved against any loaded dataset.
    /// Carries a sample of real columns so the caller can self-correct.
    #[error("column '{phrase}' not found ({total} columns available)")]
    ColumnNotFound {
        phrase: String,
        available: Vec<String>,
        total: usize,
    },

    /// Aggregation target coerced to all nulls
    #[error("column '{column}' contains no numeric values")]
    NoNumericData { column: String },

    /// Time-range target coerced to all nulls
    #[error("column '{column}' contains no valid dates")]
    NoValidDates { column: String },

    /// Malformed or incomplete QuerySpec: indicates a generator bug,
    /// should never reach the executor in practice
    #[error("invalid query spec: {message}")]
    InvalidQuerySpec { message: String },

    /// Dataset load failures: file access, CSV parsing, empty input
    #[error("ingestion error: {message}")]
    Ingestion {
        message: String,
        path: Option<String>,
    },
}

impl QaError {
    pub fn dataset_not_found(dataset_id: impl Into<String>) -> Self {
        Self::DatasetNotFound {
            dataset_id: dataset_id.into(),
        }
    }

    /// Build a `ColumnNotFound` from the full set of candidate columns,
    /// keeping only the first `AVAILABLE_COLUMN_SAMPLE` names.
    pub fn column_not_found<I, S>(phrase: impl Into<String>, available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let all: Vec<String> = available.into_iter().map(Into::into).collect();
        let total = all.len();
        let sample = all.into_iter().take(AVAILABLE_COLUMN_SAMPLE).collect();
        Self::ColumnNotFound {
            phrase: phrase.into(),
            available: sample,
            total,
        }
    }

    pub fn no_numeric_data(column: impl Into<String>) -> Self {
        Self::NoNumericData {
            column: column.into(),
        }
    }

    pub fn no_valid_dates(column: impl Into<String>) -> Self {
        Self::NoValidDates {
            column: column.into(),
        }
    }

    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidQuerySpec {
            message: message.into(),
        }
    }

    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
            path: None,
        }
    }

    pub fn ingestion_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for QaError {
    fn from(err: std::io::Error) -> Self {
        Self::Ingestion {
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<csv::Error> for QaError {
    fn from(err: csv::Error) -> Self {
        Self::Ingestion {
            message: err.to_string(),
            path: None,
        }
    }
}

/// Result type alias for engine operations
pub type QaResult<T> = Result<T, QaError>;
