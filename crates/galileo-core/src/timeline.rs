//! Timestamp reconstruction.
//!
//! The logger stores no per-sample clock. Sample `k` (zero-based, counted
//! across all blocks) was taken at `base + k * interval`.

use time::{Duration, PrimitiveDateTime};

use galileo_types::SessionMetadata;

/// Timestamp of the sample at global position `index`.
///
/// ```
/// use galileo_core::timeline::sample_timestamp;
/// use galileo_types::SessionMetadata;
/// use time::macros::datetime;
///
/// let meta = SessionMetadata::new(datetime!(2024-01-01 0:00), 15).unwrap();
/// assert_eq!(sample_timestamp(&meta, 4), datetime!(2024-01-01 1:00));
/// ```
#[must_use]
pub fn sample_timestamp(metadata: &SessionMetadata, index: u64) -> PrimitiveDateTime {
    let minutes = i64::try_from(index)
        .unwrap_or(i64::MAX)
        .saturating_mul(i64::from(metadata.interval_minutes))
        .min(i64::MAX / 60);
    metadata.base.saturating_add(Duration::minutes(minutes))
}

/// Endless iterator of sample timestamps starting at the base time.
#[derive(Debug, Clone)]
pub struct Timeline {
    metadata: SessionMetadata,
    next_index: u64,
}

impl Timeline {
    pub fn new(metadata: SessionMetadata) -> Self {
        Self {
            metadata,
            next_index: 0,
        }
    }

    /// Global index the next timestamp belongs to.
    pub fn position(&self) -> u64 {
        self.next_index
    }
}

impl Iterator for Timeline {
    type Item = PrimitiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        let ts = sample_timestamp(&self.metadata, self.next_index);
        self.next_index += 1;
        Some(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn meta(interval: u8) -> SessionMetadata {
        SessionMetadata::new(datetime!(2024-01-01 0:00), interval).unwrap()
    }

    #[test]
    fn test_index_four_at_fifteen_minutes() {
        assert_eq!(sample_timestamp(&meta(15), 4), datetime!(2024-01-01 1:00));
    }

    #[test]
    fn test_index_zero_is_base() {
        assert_eq!(sample_timestamp(&meta(255), 0), datetime!(2024-01-01 0:00));
    }

    #[test]
    fn test_crosses_day_and_year_boundaries() {
        let m = SessionMetadata::new(datetime!(2023-12-31 23:50), 10).unwrap();
        assert_eq!(sample_timestamp(&m, 1), datetime!(2024-01-01 0:00));
        assert_eq!(sample_timestamp(&m, 145), datetime!(2024-01-02 0:00));
    }

    #[test]
    fn test_timeline_matches_function() {
        let m = meta(5);
        let stamps: Vec<_> = Timeline::new(m).take(4).collect();
        assert_eq!(
            stamps,
            vec![
                datetime!(2024-01-01 0:00),
                datetime!(2024-01-01 0:05),
                datetime!(2024-01-01 0:10),
                datetime!(2024-01-01 0:15),
            ]
        );
    }

    #[test]
    fn test_huge_index_saturates() {
        let ts = sample_timestamp(&meta(255), u64::MAX);
        assert!(ts > datetime!(2024-01-01 0:00));
    }
}
