//! Platform-agnostic types for Galileo temperature/humidity dataloggers.
//!
//! This crate provides the data model shared by the serial driver
//! (galileo-core), the historical record codec (galileo-store) and the CLI.
//!
//! # Features
//!
//! - Raw memory slot decoding with terminator detection
//! - Session metadata, sample records and sessions
//! - Equipment catalog with alert/action limit bands
//! - Error types for data parsing
//!
//! # Example
//!
//! ```
//! use galileo_types::{RawSample, SampleRecord};
//! use time::macros::datetime;
//!
//! let raw = RawSample::from_bytes(&[0x00, 0x32, 0x02, 0x58]).unwrap();
//! let record = SampleRecord::from_raw(datetime!(2024-01-01 0:00), raw);
//! assert_eq!(record.temperature, 5.0);
//! assert_eq!(record.humidity, 60.0);
//! ```

pub mod equipment;
pub mod error;
pub mod types;

pub use equipment::{Bands, EquipmentCatalog, EquipmentProfile, FALLBACK_EQUIPMENT, Range};
pub use error::{ParseError, ParseResult};
pub use types::{
    RawSample, SampleRecord, Session, SessionMetadata, TIMESTAMP_FORMAT, format_timestamp,
    parse_timestamp, round2,
};
