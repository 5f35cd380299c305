// Analyzer module: the pure computations run over a fetched series.

pub mod arima;
pub mod forecast;
pub mod fundamentals;
pub mod moving_average;
pub mod returns;
pub mod volume;

pub use arima::ArimaEngine;
pub use forecast::{FittedModel, ForecastingEngine, forecast};
pub use fundamentals::fetch_fundamentals;
pub use moving_average::{MA_WINDOWS, MovingAverage, compute_moving_averages};
pub use returns::compute_returns;
pub use volume::compute_volume_series;
