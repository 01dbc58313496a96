//! Input-shape errors for data sets
//!
//! Error codes:
//! - TAB_DATA_NOT_AN_OBJECT
//! - TAB_DATA_TABLE_NOT_ARRAY
//! - TAB_DATA_MALFORMED_ROW
//! - TAB_DATA_NON_SCALAR_CELL
//! - TAB_DATA_MISSING_KEY_FIELD
//! - TAB_DATA_AMBIGUOUS_TABLE
//! - TAB_DATA_ROW_ARITY
//! - TAB_DATA_UNWRITABLE_CELL
//! - TAB_DATA_FILE_EXISTS
//! - TAB_DATA_IO
//! - TAB_DATA_JSON
//!
//! Data-quality issues are never errors; these only describe input that is
//! not organized as table -> rows at all, or a data set that cannot be
//! written back.

use thiserror::Error;

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;

/// Input-shape errors, raised before any partial result is produced
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data set must be a JSON object keyed by table name, got {0}")]
    NotAnObject(&'static str),

    #[error("table '{table}' must be an array of rows, got {actual}")]
    TableNotArray { table: String, actual: &'static str },

    #[error("table '{table}' row {position}: {reason}")]
    MalformedRow {
        table: String,
        position: usize,
        reason: String,
    },

    #[error("table '{table}' row {position} field '{field}': expected a scalar value, got {actual}")]
    NonScalarCell {
        table: String,
        position: usize,
        field: String,
        actual: &'static str,
    },

    #[error("table '{table}' row {position} is missing primary key field '{field}'")]
    MissingKeyField {
        table: String,
        position: usize,
        field: String,
    },

    #[error("table '{table}' is matched by more than one data key: {keys:?}")]
    AmbiguousTable { table: String, keys: Vec<String> },

    #[error("table '{table}' row {position}: expected {expected} values, got {actual}")]
    RowArity {
        table: String,
        position: usize,
        expected: usize,
        actual: usize,
    },

    #[error("table '{table}' row {position} field '{field}': {value} would not read back unchanged")]
    UnwritableCell {
        table: String,
        position: usize,
        field: String,
        value: String,
    },

    #[error("refusing to overwrite existing file '{0}'")]
    FileExists(String),

    #[error("failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DataError {
    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            DataError::NotAnObject(_) => "TAB_DATA_NOT_AN_OBJECT",
            DataError::TableNotArray { .. } => "TAB_DATA_TABLE_NOT_ARRAY",
            DataError::MalformedRow { .. } => "TAB_DATA_MALFORMED_ROW",
            DataError::NonScalarCell { .. } => "TAB_DATA_NON_SCALAR_CELL",
            DataError::MissingKeyField { .. } => "TAB_DATA_MISSING_KEY_FIELD",
            DataError::AmbiguousTable { .. } => "TAB_DATA_AMBIGUOUS_TABLE",
            DataError::RowArity { .. } => "TAB_DATA_ROW_ARITY",
            DataError::UnwritableCell { .. } => "TAB_DATA_UNWRITABLE_CELL",
            DataError::FileExists(_) => "TAB_DATA_FILE_EXISTS",
            DataError::Io { .. } => "TAB_DATA_IO",
            DataError::Json { .. } => "TAB_DATA_JSON",
        }
    }
}
