//! Error types for the ingestion core
//!
//! User-input problems (a malformed integer, an empty table name) never reach
//! this type: they are handled by re-prompting. Everything here terminates the
//! run.

use thiserror::Error;

/// Result type alias for ingestion operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Warehouse query or connection failed
    #[error("Warehouse error: {0}. Check the BATCHLOAD_DB_* connection settings.")]
    Warehouse(#[from] sqlx::Error),

    /// Landing-zone upload failed
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Interactive prompt could not be completed (closed terminal, Ctrl+C)
    #[error("Prompt aborted: {0}")]
    Prompt(String),

    /// Input file could not be parsed as CSV
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] batchload_common::BatchloadError),

    /// Input file has no header row
    #[error("Input file '{0}' has no columns")]
    EmptyInput(String),

    /// A data record has more fields than the header
    #[error("Line {line} has {found} fields, but the header has {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A ledger query result lacks an expected column
    #[error("Column '{column}' missing from result of: {query}")]
    MissingColumn { column: String, query: String },

    /// A result cell had an unexpected type
    #[error("Column '{column}' has unexpected value {found}")]
    UnexpectedValue { column: String, found: String },

    /// Warehouse cell type that cannot be mapped to a table value
    #[error("Unsupported column type '{type_name}' for column '{column}'")]
    UnsupportedType { column: String, type_name: String },
}

impl IngestError {
    /// Create an upload error
    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }

    /// Create a prompt error
    pub fn prompt(msg: impl Into<String>) -> Self {
        Self::Prompt(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
