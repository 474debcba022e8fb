//! History file names.
//!
//! `{YYYY-MM-DD}__{HH-MM-SS}__{equipment}[__{tag}].csv`
//!
//! The capture time leads so that names sort lexically by capture time.

use time::{Date, Month, PrimitiveDateTime, Time};

use galileo_types::FALLBACK_EQUIPMENT;

/// Extension of every history file.
pub const EXTENSION: &str = ".csv";

/// Separator between name segments.
pub const SEGMENT_SEPARATOR: &str = "__";

const ILLEGAL_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Strip characters that are illegal in Windows or Unix file names, then
/// trim surrounding whitespace.
///
/// Runs of underscores that would read as a segment separator are
/// collapsed so the name always splits back into the same segments.
///
/// ```
/// use galileo_store::naming::sanitize_segment;
///
/// assert_eq!(sanitize_segment(" lab: 1/2 "), "lab 12");
/// assert_eq!(sanitize_segment("a__b"), "a_b");
/// ```
pub fn sanitize_segment(raw: &str) -> String {
    let mut cleaned: String = raw.chars().filter(|c| !ILLEGAL_CHARS.contains(c)).collect();
    while cleaned.contains(SEGMENT_SEPARATOR) {
        cleaned = cleaned.replace(SEGMENT_SEPARATOR, "_");
    }
    cleaned.trim().to_string()
}

/// Build the file name for a session captured at `captured_at`.
///
/// A tag that is empty after sanitization is omitted. Equipment that is
/// empty after sanitization becomes [`FALLBACK_EQUIPMENT`].
///
/// ```
/// use galileo_store::naming::file_name;
/// use time::macros::datetime;
///
/// let name = file_name(datetime!(2024-03-15 14:30:05), "HELADERA", Some("LAB1"));
/// assert_eq!(name, "2024-03-15__14-30-05__HELADERA__LAB1.csv");
/// ```
pub fn file_name(captured_at: PrimitiveDateTime, equipment: &str, tag: Option<&str>) -> String {
    let mut equipment = sanitize_segment(equipment);
    if equipment.is_empty() {
        equipment = FALLBACK_EQUIPMENT.to_string();
    }

    let mut name = format!(
        "{:04}-{:02}-{:02}{sep}{:02}-{:02}-{:02}{sep}{}",
        captured_at.year(),
        u8::from(captured_at.month()),
        captured_at.day(),
        captured_at.hour(),
        captured_at.minute(),
        captured_at.second(),
        equipment,
        sep = SEGMENT_SEPARATOR,
    );

    if let Some(tag) = tag.map(sanitize_segment).filter(|t| !t.is_empty()) {
        name.push_str(SEGMENT_SEPARATOR);
        name.push_str(&tag);
    }
    name.push_str(EXTENSION);
    name
}

/// Labels recovered from a history file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameParts {
    /// Capture time, when the first two segments hold one.
    pub captured_at: Option<PrimitiveDateTime>,
    /// Third segment, or [`FALLBACK_EQUIPMENT`].
    pub equipment: String,
    /// Fourth segment; empty when absent.
    pub tag: String,
}

/// Split a history file name into its labelled segments.
///
/// Never fails: names without enough segments fall back to
/// [`FALLBACK_EQUIPMENT`] and an empty tag.
pub fn parse_file_name(name: &str) -> FileNameParts {
    let stem = name.strip_suffix(EXTENSION).unwrap_or(name);
    let segments: Vec<&str> = stem.split(SEGMENT_SEPARATOR).collect();

    let captured_at = match segments.as_slice() {
        [date, time, ..] => parse_capture_time(date, time),
        _ => None,
    };

    FileNameParts {
        captured_at,
        equipment: segments
            .get(2)
            .map_or_else(|| FALLBACK_EQUIPMENT.to_string(), |s| (*s).to_string()),
        tag: segments.get(3).map(|s| (*s).to_string()).unwrap_or_default(),
    }
}

fn parse_capture_time(date: &str, time: &str) -> Option<PrimitiveDateTime> {
    let fields = |s: &str| -> Option<Vec<u32>> {
        s.split('-').map(|p| p.parse().ok()).collect()
    };

    let (date, time) = (fields(date)?, fields(time)?);
    let [year, month, day] = date.as_slice() else {
        return None;
    };
    let [hour, minute, second] = time.as_slice() else {
        return None;
    };

    let month = Month::try_from(u8::try_from(*month).ok()?).ok()?;
    let date = Date::from_calendar_date(i32::try_from(*year).ok()?, month, u8::try_from(*day).ok()?)
        .ok()?;
    let time = Time::from_hms(
        u8::try_from(*hour).ok()?,
        u8::try_from(*minute).ok()?,
        u8::try_from(*second).ok()?,
    )
    .ok()?;
    Some(PrimitiveDateTime::new(date, time))
}

/// Whether `name` can only refer to a file directly inside the archive.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}
