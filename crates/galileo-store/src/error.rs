//! Error types for galileo-store.

use std::path::PathBuf;

/// Result type for galileo-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in galileo-store.
///
/// Decode errors carry the 1-based line of the offending row.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited text.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to create the archive directory.
    #[error("Failed to create archive directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The name cannot refer to a file inside the archive.
    #[error("Invalid history file name: {0:?}")]
    InvalidFileName(String),

    /// A data row whose timestamp does not parse.
    #[error("Invalid timestamp on line {row}: {value:?}")]
    InvalidTimestamp { row: usize, value: String },

    /// A data row whose temperature or humidity does not parse.
    #[error("Invalid number on line {row}: {value:?}")]
    InvalidNumber { row: usize, value: String },

    /// Sessions without samples are never written.
    #[error("Refusing to save a session without samples")]
    EmptySession,

    /// No such file in the archive.
    #[error("History file not found: {0}")]
    NotFound(String),
}
