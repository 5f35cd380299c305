// Utility functions
use chrono::{DateTime, NaiveDate};

/// Converts unix seconds to the calendar date at the given UTC offset (seconds).
pub fn date_from_unix(timestamp: i64, gmt_offset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp.checked_add(gmt_offset)?, 0).map(|dt| dt.date_naive())
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
