//! Session header location and decoding.
//!
//! The logger answers a header request with up to 64 bytes which may be
//! preceded by line noise. The header proper is a 28-byte window starting
//! with the `D1 1C` magic prefix:
//!
//! | Offset | Field |
//! |--------|-------|
//! | 0-1 | magic `D1 1C` |
//! | 14 | year, BCD, + 2000 |
//! | 15 | month, BCD |
//! | 16 | day, BCD |
//! | 17 | hour, BCD |
//! | 18 | minute, BCD |
//! | 19 | second, BCD |
//! | 20 | recording interval in minutes, raw byte |

use time::{Date, Month, PrimitiveDateTime, Time};

use galileo_types::SessionMetadata;

use crate::commands::HEADER_MAGIC;
use crate::error::ProtocolError;

/// Length of the header window.
pub const HEADER_LEN: usize = 28;

const YEAR_OFFSET: usize = 14;
const MONTH_OFFSET: usize = 15;
const DAY_OFFSET: usize = 16;
const HOUR_OFFSET: usize = 17;
const MINUTE_OFFSET: usize = 18;
const SECOND_OFFSET: usize = 19;
const INTERVAL_OFFSET: usize = 20;

/// Decode one packed-decimal byte: high nibble tens, low nibble units.
///
/// ```
/// use galileo_core::header::bcd_to_int;
///
/// assert_eq!(bcd_to_int(0x23), 23);
/// assert_eq!(bcd_to_int(0x99), 99);
/// ```
#[must_use]
pub const fn bcd_to_int(byte: u8) -> u8 {
    (byte >> 4) * 10 + (byte & 0x0F)
}

/// Whether both nibbles of `byte` are decimal digits.
#[must_use]
pub const fn is_bcd(byte: u8) -> bool {
    (byte >> 4) <= 9 && (byte & 0x0F) <= 9
}

const BCD_OFFSETS: [usize; 6] = [
    YEAR_OFFSET,
    MONTH_OFFSET,
    DAY_OFFSET,
    HOUR_OFFSET,
    MINUTE_OFFSET,
    SECOND_OFFSET,
];

/// The 28-byte header window exactly as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHeader {
    bytes: [u8; HEADER_LEN],
}

impl RawHeader {
    /// Find the header inside a response buffer.
    ///
    /// Offset 0 is tried first, then every later offset that still leaves
    /// room for a full window, so leading garbage is tolerated.
    pub fn locate(buf: &[u8]) -> Result<Self, ProtocolError> {
        buf.windows(HEADER_LEN)
            .find(|w| w[..HEADER_MAGIC.len()] == HEADER_MAGIC)
            .and_then(|w| w.try_into().ok())
            .map(|bytes| Self { bytes })
            .ok_or(ProtocolError::HeaderNotFound { scanned: buf.len() })
    }

    /// The raw window bytes.
    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.bytes
    }

    /// Calendar year (2000-based).
    pub fn year(&self) -> i32 {
        2000 + i32::from(bcd_to_int(self.bytes[YEAR_OFFSET]))
    }

    pub fn month(&self) -> u8 {
        bcd_to_int(self.bytes[MONTH_OFFSET])
    }

    pub fn day(&self) -> u8 {
        bcd_to_int(self.bytes[DAY_OFFSET])
    }

    pub fn hour(&self) -> u8 {
        bcd_to_int(self.bytes[HOUR_OFFSET])
    }

    pub fn minute(&self) -> u8 {
        bcd_to_int(self.bytes[MINUTE_OFFSET])
    }

    pub fn second(&self) -> u8 {
        bcd_to_int(self.bytes[SECOND_OFFSET])
    }

    /// Recording interval in minutes, taken verbatim.
    pub fn interval_minutes(&self) -> u8 {
        self.bytes[INTERVAL_OFFSET]
    }

    /// Validate the fields and build session metadata.
    pub fn decode(&self) -> Result<SessionMetadata, ProtocolError> {
        let invalid_date = || ProtocolError::InvalidDate {
            year: self.year(),
            month: self.month(),
            day: self.day(),
            hour: self.hour(),
            minute: self.minute(),
            second: self.second(),
        };

        if !BCD_OFFSETS.iter().all(|&i| is_bcd(self.bytes[i])) {
            return Err(invalid_date());
        }

        let month = Month::try_from(self.month()).map_err(|_| invalid_date())?;
        let date =
            Date::from_calendar_date(self.year(), month, self.day()).map_err(|_| invalid_date())?;
        let time = Time::from_hms(self.hour(), self.minute(), self.second())
            .map_err(|_| invalid_date())?;

        let interval = self.interval_minutes();
        if interval == 0 {
            return Err(ProtocolError::InvalidInterval);
        }

        SessionMetadata::new(PrimitiveDateTime::new(date, time), interval)
            .map_err(|_| ProtocolError::InvalidInterval)
    }
}

/// Locate and decode the session header in one step.
pub fn decode_header(buf: &[u8]) -> Result<SessionMetadata, ProtocolError> {
    RawHeader::locate(buf)?.decode()
}
