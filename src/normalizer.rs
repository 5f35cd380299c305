use crate::model::Quote;

/// Orders raw quotes by date, drops rows without a usable close and
/// collapses duplicate dates (the later row wins).
pub fn normalize_quotes(mut quotes: Vec<Quote>) -> Vec<Quote> {
    quotes.retain(|q| q.close.is_finite());
    // stable sort keeps source order among equal dates
    quotes.sort_by_key(|q| q.date);

    let mut out: Vec<Quote> = Vec::with_capacity(quotes.len());
    for quote in quotes {
        match out.last_mut() {
            Some(last) if last.date == quote.date => *last = quote,
            _ => out.push(quote),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeSeries;
    use chrono::NaiveDate;

    fn quote(day: u32, close: f64) -> Quote {
        Quote {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_sorts_and_dedups() {
        let raw = vec![quote(3, 30.0), quote(1, 10.0), quote(2, 20.0), quote(3, 31.0)];
        let normalized = normalize_quotes(raw);
        let closes: Vec<f64> = normalized.iter().map(|q| q.close).collect();
        assert_eq!(closes, vec![10.0, 20.0, 31.0]);
        assert!(TimeSeries::closes(&normalized).is_ok());
    }

    #[test]
    fn test_drops_non_finite_close() {
        let raw = vec![quote(1, 10.0), quote(2, f64::NAN), quote(3, f64::INFINITY)];
        assert_eq!(normalize_quotes(raw).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_quotes(Vec::new()).is_empty());
    }
}
