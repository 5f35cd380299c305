use crate::model::{Quote, SeriesError, TimeSeries};

/// (date, volume) projection of an ordered quote sequence.
pub fn compute_volume_series(quotes: &[Quote]) -> Result<TimeSeries, SeriesError> {
    TimeSeries::from_pairs(quotes.iter().map(|q| (q.date, q.volume as f64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn quote(day: u32, volume: u64) -> Quote {
        Quote {
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume,
        }
    }

    #[test]
    fn test_projection_is_lossless_and_ordered() {
        let quotes = vec![quote(3, 1_500), quote(4, 0), quote(5, 9_876_543_210)];
        let series = compute_volume_series(&quotes).unwrap();

        let back: Vec<(NaiveDate, u64)> = series
            .to_pairs()
            .into_iter()
            .map(|(date, v)| (date, v as u64))
            .collect();
        let expected: Vec<(NaiveDate, u64)> = quotes.iter().map(|q| (q.date, q.volume)).collect();
        assert_eq!(back, expected);
    }

    #[test]
    fn test_unordered_quotes_rejected() {
        assert!(compute_volume_series(&[quote(5, 1), quote(4, 2)]).is_err());
    }
}
