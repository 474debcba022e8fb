//! Session statistics.

use serde::Serialize;
use time::PrimitiveDateTime;

use galileo_types::{SampleRecord, round2, types::timestamp_serde};

/// Unit label for temperatures.
pub const TEMPERATURE_UNIT: &str = "°C";
/// Unit label for relative humidity.
pub const HUMIDITY_UNIT: &str = "%rH";

/// Minimum, maximum and mean of one measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    /// Arithmetic mean, rounded to 2 decimals.
    pub mean: f64,
}

impl FieldStats {
    fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        let (min, max, sum, count) = values.fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0usize),
            |(min, max, sum, n), v| (min.min(v), max.max(v), sum + v, n + 1),
        );
        (count > 0).then(|| Self {
            min,
            max,
            mean: round2(sum / count as f64),
        })
    }
}

/// Statistics over a non-empty sample sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Timestamp of the first sample in sequence order.
    #[serde(with = "timestamp_serde")]
    pub start: PrimitiveDateTime,
    /// Timestamp of the last sample in sequence order.
    #[serde(with = "timestamp_serde")]
    pub end: PrimitiveDateTime,
    pub count: usize,
    pub temperature: FieldStats,
    pub humidity: FieldStats,
    pub temperature_unit: &'static str,
    pub humidity_unit: &'static str,
}

/// Aggregate view of a session. Empty when there are no samples.
///
/// An empty summary serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    #[serde(flatten)]
    stats: Option<SummaryStats>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.stats.is_none()
    }

    pub fn stats(&self) -> Option<&SummaryStats> {
        self.stats.as_ref()
    }

    pub fn into_stats(self) -> Option<SummaryStats> {
        self.stats
    }
}

/// Summarize `samples` without reordering them.
///
/// ```
/// use galileo_core::summary::summarize;
/// use galileo_types::SampleRecord;
/// use time::macros::datetime;
///
/// let samples = vec![
///     SampleRecord::new(datetime!(2024-01-01 0:00), 4.0, 60.0),
///     SampleRecord::new(datetime!(2024-01-01 0:15), 6.0, 62.0),
/// ];
/// let stats = summarize(&samples).into_stats().unwrap();
/// assert_eq!(stats.temperature.mean, 5.0);
/// assert_eq!(stats.humidity.max, 62.0);
/// ```
pub fn summarize(samples: &[SampleRecord]) -> Summary {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Summary::default();
    };

    let temperature = FieldStats::from_values(samples.iter().map(|s| s.temperature));
    let humidity = FieldStats::from_values(samples.iter().map(|s| s.humidity));

    let stats = temperature.zip(humidity).map(|(temperature, humidity)| SummaryStats {
        start: first.timestamp,
        end: last.timestamp,
        count: samples.len(),
        temperature,
        humidity,
        temperature_unit: TEMPERATURE_UNIT,
        humidity_unit: HUMIDITY_UNIT,
    });

    Summary { stats }
}
