use crate::model::{ReturnHorizon, ReturnWindow, TimeSeries};

/// Percentage change from `lookback` samples ago to the latest sample.
/// Horizons without enough history report 0.0 with `defined == false`.
pub fn compute_returns(series: &TimeSeries, horizons: &[ReturnHorizon]) -> Vec<ReturnWindow> {
    let points = series.points();
    let len = points.len();

    horizons
        .iter()
        .map(|h| {
            let percent = if h.lookback < len {
                let latest = points[len - 1].value;
                let base = points[len - 1 - h.lookback].value;
                (base != 0.0)
                    .then(|| (latest / base - 1.0) * 100.0)
                    .filter(|p| p.is_finite())
            } else {
                None
            };

            ReturnWindow {
                label: h.label.clone(),
                lookback: h.lookback,
                percent: percent.unwrap_or(0.0),
                defined: percent.is_some(),
            }
        })
        .collect()
}
