//! Error types for manifest-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in manifest-core
#[derive(Debug, Error)]
pub enum Error {
    /// The base sheet was absent, or none of its rows survived filtering
    #[error("sheet '{sheet}' not found or contained no rows")]
    MissingBaseData { sheet: String },

    /// A numeric cell could not be represented as an unsigned integer
    #[error("value {value} in column '{column}' of sheet '{sheet}' is out of integer range")]
    IntegerOverflow {
        sheet: String,
        column: String,
        value: f64,
    },

    /// The workbook decoder failed
    #[error("failed to decode '{source_name}': {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{source_name}': {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No non-base sheet with this name
    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    /// No base row with this slug
    #[error("base row '{0}' not found")]
    BaseRowNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
