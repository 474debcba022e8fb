//! Error types for galileo-core.
//!
//! This module defines the errors that can end a datalogger session.
//!
//! # Fatal vs. partial
//!
//! | Error | Phase | Effect |
//! |-------|-------|--------|
//! | [`TransportError`] at open | before handshake | Session aborted |
//! | [`TransportError`] during handshake/header | header | Session aborted |
//! | [`ProtocolError::HeaderNotFound`] | header | Session aborted |
//! | [`ProtocolError::InvalidDate`] | header | Session aborted |
//! | [`ProtocolError::InvalidInterval`] | header | Session aborted |
//!
//! Once the header has been decoded nothing is an error any more: an empty
//! read, an empty block, a failed write or a closed port during the block
//! scan all end the download with a partial session and a
//! [`StopReason`](crate::StopReason) describing why.
//!
//! No retries are performed here. Whether to retry a failed session is up
//! to the caller.

use thiserror::Error;

/// Errors that can occur when talking to a Galileo datalogger.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Serial transport failure.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device answered, but not with a usable session header.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures of the serial byte channel.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The port could not be opened (missing, busy, permission denied).
    #[error("Failed to open {port}: {source}")]
    Open {
        /// Port name as given by the caller.
        port: String,
        /// Underlying serial port error.
        #[source]
        source: serialport::Error,
    },

    /// Control-line or configuration failure on an open port.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error while writing or reading.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The transport has been closed.
    #[error("Transport closed")]
    Closed,
}

/// Header-phase protocol failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// No `D1 1C` magic prefix anywhere in the header response.
    #[error("Session header not found in {scanned} byte response")]
    HeaderNotFound {
        /// Number of bytes searched.
        scanned: usize,
    },

    /// The BCD date/time fields do not form a valid calendar date.
    #[error(
        "Invalid header date {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
    )]
    InvalidDate {
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    },

    /// The header declares a zero-minute recording interval.
    #[error("Invalid recording interval: 0 minutes")]
    InvalidInterval,
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether this error came from the serial channel.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether this error came from header validation.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

/// Result type alias using galileo-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
