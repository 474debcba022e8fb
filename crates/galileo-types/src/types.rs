//! Core types for Galileo datalogger sessions.

use core::fmt;

use bytes::Buf;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::error::{ParseError, ParseResult};

/// Format used for sample timestamps on the wire to collaborators and in
/// historical files.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS`.
///
/// ```
/// use galileo_types::format_timestamp;
/// use time::macros::datetime;
///
/// assert_eq!(format_timestamp(datetime!(2024-01-05 07:08:09)), "2024-01-05 07:08:09");
/// ```
#[must_use]
pub fn format_timestamp(ts: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_timestamp(s: &str) -> ParseResult<PrimitiveDateTime> {
    PrimitiveDateTime::parse(s.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| ParseError::InvalidTimestamp(s.to_string()))
}

/// Round a physical value to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Serde adapter for timestamps in `YYYY-MM-DD HH:MM:SS` form.
#[cfg(feature = "serde")]
pub mod timestamp_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    pub fn serialize<S: Serializer>(ts: &PrimitiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(*ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<PrimitiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional timestamps; `None` maps to `null`.
#[cfg(feature = "serde")]
pub mod option_timestamp_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    pub fn serialize<S: Serializer>(
        ts: &Option<PrimitiveDateTime>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => super::timestamp_serde::serialize(ts, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<PrimitiveDateTime>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| super::parse_timestamp(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// One 4-byte sample slot as stored in device memory.
///
/// Both fields are big-endian unsigned tenths (°C and %rH).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSample {
    /// Temperature in tenths of a degree Celsius.
    pub temperature_raw: u16,
    /// Relative humidity in tenths of a percent.
    pub humidity_raw: u16,
}

impl RawSample {
    /// Size of one sample stride in bytes.
    pub const SIZE: usize = 4;

    /// Decode a sample from the first four bytes of `data`.
    ///
    /// ```
    /// use galileo_types::RawSample;
    ///
    /// let sample = RawSample::from_bytes(&[0x00, 0xE6, 0x02, 0x58]).unwrap();
    /// assert_eq!(sample.temperature_raw, 230);
    /// assert_eq!(sample.humidity_raw, 600);
    /// ```
    pub fn from_bytes(data: &[u8]) -> ParseResult<Self> {
        if data.len() < Self::SIZE {
            return Err(ParseError::InsufficientBytes {
                expected: Self::SIZE,
                actual: data.len(),
            });
        }

        let mut buf = data;
        Ok(Self {
            temperature_raw: buf.get_u16(),
            humidity_raw: buf.get_u16(),
        })
    }

    /// Whether this slot marks the end of recorded data.
    ///
    /// Erased memory reads back as `0x0000` or `0xFFFF`; a slot is only a
    /// terminator when both fields hold one of those patterns.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        is_empty_word(self.temperature_raw) && is_empty_word(self.humidity_raw)
    }

    /// Temperature in °C.
    #[must_use]
    pub fn temperature(&self) -> f64 {
        f64::from(self.temperature_raw) / 10.0
    }

    /// Relative humidity in %rH.
    #[must_use]
    pub fn humidity(&self) -> f64 {
        f64::from(self.humidity_raw) / 10.0
    }
}

fn is_empty_word(word: u16) -> bool {
    word == 0x0000 || word == 0xFFFF
}

/// Recording parameters decoded from the session header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionMetadata {
    /// Time of the first sample, in the device's local clock.
    #[cfg_attr(feature = "serde", serde(with = "timestamp_serde"))]
    pub base: PrimitiveDateTime,
    /// Minutes between consecutive samples (never zero).
    pub interval_minutes: u8,
}

impl SessionMetadata {
    /// Create metadata, rejecting a zero interval.
    pub fn new(base: PrimitiveDateTime, interval_minutes: u8) -> ParseResult<Self> {
        if interval_minutes == 0 {
            return Err(ParseError::InvalidValue(
                "recording interval must be at least one minute".to_string(),
            ));
        }
        Ok(Self {
            base,
            interval_minutes,
        })
    }

    /// Interval between samples as a duration.
    #[must_use]
    pub fn interval(&self) -> time::Duration {
        time::Duration::minutes(i64::from(self.interval_minutes))
    }
}

impl fmt::Display for SessionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "started {} every {} min",
            format_timestamp(self.base),
            self.interval_minutes
        )
    }
}

/// A decoded sample with its reconstructed timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleRecord {
    /// Reconstructed time of the sample.
    #[cfg_attr(feature = "serde", serde(with = "timestamp_serde"))]
    pub timestamp: PrimitiveDateTime,
    /// Temperature in °C, rounded to two decimals.
    pub temperature: f64,
    /// Relative humidity in %rH, rounded to two decimals.
    pub humidity: f64,
}

impl SampleRecord {
    /// Build a record, rounding both values to two decimals.
    #[must_use]
    pub fn new(timestamp: PrimitiveDateTime, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp,
            temperature: round2(temperature),
            humidity: round2(humidity),
        }
    }

    /// Build a record from a raw memory slot.
    #[must_use]
    pub fn from_raw(timestamp: PrimitiveDateTime, raw: RawSample) -> Self {
        Self::new(timestamp, raw.temperature(), raw.humidity())
    }
}

/// One complete capture: equipment label, optional tag and ordered samples.
///
/// Sessions are immutable once built.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Session {
    equipment: String,
    #[cfg_attr(feature = "serde", serde(default))]
    tag: Option<String>,
    samples: Vec<SampleRecord>,
}

impl Session {
    /// Create a session without a tag.
    pub fn new(equipment: impl Into<String>, samples: Vec<SampleRecord>) -> Self {
        Self {
            equipment: equipment.into(),
            tag: None,
            samples,
        }
    }

    /// Attach a user tag. Blank tags are dropped.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = if tag.trim().is_empty() { None } else { Some(tag) };
        self
    }

    /// Equipment label.
    pub fn equipment(&self) -> &str {
        &self.equipment
    }

    /// User tag, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Samples in acquisition order.
    pub fn samples(&self) -> &[SampleRecord] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the session holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consume the session, returning its samples.
    pub fn into_samples(self) -> Vec<SampleRecord> {
        self.samples
    }
}
