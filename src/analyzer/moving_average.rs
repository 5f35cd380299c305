use crate::model::{SeriesPoint, TimeSeries};
use serde::Serialize;

/// 20-, 50- and 200-sample windows shown on the price chart.
pub const MA_WINDOWS: [usize; 3] = [20, 50, 200];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverage {
    pub window: usize,
    /// Starts at the first date where the window is full.
    pub series: TimeSeries,
}

impl MovingAverage {
    pub fn label(&self) -> String {
        format!("{}-Day MA", self.window)
    }
}

/// Calculates the moving average of a slice of data with the given window size.
pub fn moving_average(data: &[f64], window_size: usize) -> Vec<f64> {
    if window_size == 0 || data.len() < window_size {
        return Vec::new();
    }
    data.windows(window_size)
        .map(|window| window.iter().sum::<f64>() / window_size as f64)
        .collect()
}

/// One trailing simple moving average per window, aligned to the source dates.
pub fn compute_moving_averages(series: &TimeSeries, windows: &[usize]) -> Vec<MovingAverage> {
    let values: Vec<f64> = series.values().collect();

    windows
        .iter()
        .map(|&window| {
            let points = series
                .points()
                .iter()
                .skip(window.saturating_sub(1))
                .zip(moving_average(&values, window))
                .map(|(p, value)| SeriesPoint {
                    date: p.date,
                    value,
                })
                .collect();
            MovingAverage {
                window,
                series: TimeSeries::from_ordered(points),
            }
        })
        .collect()
}
