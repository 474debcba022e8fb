//! Serial protocol driver for Galileo temperature/humidity dataloggers.
//!
//! This crate talks to the logger over a serial line, reconstructs the
//! recorded session and computes derived views over it.
//!
//! # Features
//!
//! - **Download**: wake the logger, decode its session header, scan memory blocks
//! - **Timestamps**: rebuild each sample's time from the header base and interval
//! - **Cancellation**: stop a running scan and keep what was read
//! - **Summary**: min/max/mean statistics over a session
//! - **Limits**: alert/action classification against an equipment profile
//! - **Mock transport**: run the full protocol without hardware
//!
//! # Protocol
//!
//! | Step | Command | Response |
//! |------|---------|----------|
//! | Wake | `5C` | 16 bytes, discarded |
//! | Header | `AD DA` | up to 64 bytes holding a 28-byte header |
//! | Block `n` | `D3 DA n 00 00` | 128 bytes, 32 samples of 4 bytes |
//!
//! A failed wake or header step aborts the download with an [`Error`]. The
//! block scan never fails; it stops and reports a [`StopReason`].
//!
//! # Quick Start
//!
//! ```no_run
//! use galileo_core::{Datalogger, DownloadOptions, Timing};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut logger = Datalogger::open("/dev/ttyUSB0", 9600, Timing::default()).await?;
//!     let download = logger.download(&DownloadOptions::default()).await?;
//!     logger.close().await?;
//!
//!     println!("{} samples since {}", download.samples.len(), download.metadata.base);
//!     Ok(())
//! }
//! ```

pub mod blocks;
pub mod commands;
pub mod device;
pub mod error;
pub mod header;
pub mod limits;
pub mod mock;
pub mod samples;
pub mod summary;
pub mod timeline;
pub mod transport;

// Core exports
pub use blocks::{Block, BlockRead, BlockReader, StopReason};
pub use device::{
    Datalogger, Download, DownloadOptions, DownloadProgress, ProgressCallback, Timing,
    download_from_port,
};
pub use error::{Error, ProtocolError, Result, TransportError};
pub use header::{RawHeader, bcd_to_int, decode_header, is_bcd};
pub use limits::{
    ExcursionReport, LimitLevel, SampleEvaluation, evaluate_sample, excursion_report,
};
pub use mock::{MockTransport, MockTransportBuilder};
pub use samples::{Samples, decode_samples};
pub use summary::{FieldStats, Summary, SummaryStats, summarize};
pub use timeline::{Timeline, sample_timestamp};
pub use transport::{PortInfo, SerialTransport, Transport, available_ports};

// Re-export from galileo-types
pub use galileo_types::{
    EquipmentCatalog, EquipmentProfile, RawSample, SampleRecord, Session, SessionMetadata,
};
