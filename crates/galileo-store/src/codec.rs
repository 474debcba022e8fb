//! Semicolon-delimited history file codec.
//!
//! Current files:
//!
//! ```text
//! #;Equipo:;HELADERA;Tag:;LAB1
//! Fecha;Temperatura;Humedad
//! 2024-01-01 00:00:00;5.0;60.0
//! ```
//!
//! Legacy files omit the first row. Either way the equipment and tag are
//! taken from the file name, never from the metadata row.

use std::io::{Read, Write};

use serde::Serialize;
use time::PrimitiveDateTime;
use tracing::debug;

use galileo_types::types::option_timestamp_serde;
use galileo_types::{SampleRecord, Session, format_timestamp, parse_timestamp};

use crate::error::{Error, Result};
use crate::naming::parse_file_name;

/// Field separator. Not a comma, so decimals never collide with it.
pub const DELIMITER: u8 = b';';

/// First field of the metadata row.
pub const METADATA_MARKER: &str = "#";

/// Column header row.
pub const COLUMN_HEADER: [&str; 3] = ["Fecha", "Temperatura", "Humedad"];

/// Layout a history file was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordVariant {
    /// Metadata row, column header, data.
    Current,
    /// Column header, data.
    Legacy,
}

impl RecordVariant {
    /// Index of the first data row.
    pub fn data_start(&self) -> usize {
        match self {
            RecordVariant::Current => 2,
            RecordVariant::Legacy => 1,
        }
    }
}

/// A decoded history file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalRecord {
    pub file_name: String,
    pub variant: RecordVariant,
    #[serde(with = "option_timestamp_serde")]
    pub captured_at: Option<PrimitiveDateTime>,
    pub session: Session,
}

/// Format a value with at most two decimals and at least one.
///
/// ```
/// use galileo_store::codec::format_decimal;
///
/// assert_eq!(format_decimal(5.0), "5.0");
/// assert_eq!(format_decimal(23.45), "23.45");
/// assert_eq!(format_decimal(-0.5), "-0.5");
/// ```
pub fn format_decimal(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let mut s = format!("{:.2}", value);
    if s.ends_with('0') {
        s.pop();
    }
    if s == "-0.0" {
        s.remove(0);
    }
    s
}

/// Write `session` in the current layout.
pub fn encode_session<W: Write>(session: &Session, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_writer(writer);

    wtr.write_record([
        METADATA_MARKER,
        "Equipo:",
        session.equipment(),
        "Tag:",
        session.tag().unwrap_or(""),
    ])?;
    wtr.write_record(COLUMN_HEADER)?;

    for sample in session.samples() {
        wtr.write_record([
            format_timestamp(sample.timestamp),
            format_decimal(sample.temperature),
            format_decimal(sample.humidity),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Decode a history file. `file_name` supplies the equipment and tag.
///
/// Rows with fewer than three fields are skipped. Any other malformed row
/// fails the whole file.
pub fn decode_record<R: Read>(file_name: &str, reader: R) -> Result<HistoricalRecord> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let rows = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;

    let variant = match rows.first().and_then(|r| r.get(0)) {
        Some(first) if first.starts_with(METADATA_MARKER) => RecordVariant::Current,
        _ => RecordVariant::Legacy,
    };

    let mut samples = Vec::with_capacity(rows.len().saturating_sub(variant.data_start()));
    for (index, row) in rows.iter().enumerate().skip(variant.data_start()) {
        let line = row.position().map_or(index + 1, |p| p.line() as usize);
        let (Some(ts), Some(temp), Some(hum)) = (row.get(0), row.get(1), row.get(2)) else {
            debug!("{}: skipping short row on line {}", file_name, line);
            continue;
        };

        let timestamp = parse_timestamp(ts).map_err(|_| Error::InvalidTimestamp {
            row: line,
            value: ts.to_string(),
        })?;
        samples.push(SampleRecord::new(
            timestamp,
            parse_number(temp, line)?,
            parse_number(hum, line)?,
        ));
    }

    let parts = parse_file_name(file_name);
    Ok(HistoricalRecord {
        file_name: file_name.to_string(),
        variant,
        captured_at: parts.captured_at,
        session: Session::new(parts.equipment, samples).with_tag(parts.tag),
    })
}

fn parse_number(raw: &str, row: usize) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidNumber {
            row,
            value: raw.to_string(),
        })
}
