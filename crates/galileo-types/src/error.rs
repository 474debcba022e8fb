//! Error types for data parsing in galileo-types.

use thiserror::Error;

/// Errors that can occur when parsing Galileo datalogger data.
///
/// This error type is transport-agnostic and does not include
/// serial-port errors (those belong in galileo-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Not enough bytes to decode the requested structure.
    #[error("Insufficient bytes: requires {expected} bytes, got {actual}")]
    InsufficientBytes {
        /// Number of bytes required.
        expected: usize,
        /// Number of bytes available.
        actual: usize,
    },

    /// A decoded value is outside its valid range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A timestamp string does not match `YYYY-MM-DD HH:MM:SS`.
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Result type alias using galileo-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
