use crate::sqlite3::DbId;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Worker channel error: {0}")]
    Channel(String),

    #[error("Storage I/O error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid database filename: {0:?}")]
    InvalidFilename(String),

    #[error("Unsupported database uri: {0}")]
    UnsupportedVfs(String),

    #[error("Not a SQLite database file")]
    InvalidDatabaseFile,

    #[error("Connection {0} is not open")]
    UnknownConnection(DbId),

    #[error("Missing value for bound parameter {0}")]
    MissingParameter(String),

    #[error("Positional and named parameters cannot be mixed in one statement")]
    MixedParameters,

    #[error("Column {0} missing from result row")]
    MissingColumn(String),

    #[error("Column {column} could not be decoded: {reason}")]
    Decode { column: String, reason: String },

    #[error("Invalid date/time {0:?}")]
    InvalidDate(String),

    #[error("Task content must not be empty")]
    EmptyContent,
}

impl StoreError {
    pub(crate) fn decode(column: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Decode {
            column: column.into(),
            reason: reason.into(),
        }
    }
}
