use crate::model::{ArimaOrder, ForecastPoint, ForecastResult, ModelFitError, TimeSeries};
use chrono::NaiveDate;
use tracing::info;

/// Fits a model of the given order to a value history.
pub trait ForecastingEngine: Send + Sync {
    fn fit(
        &self,
        values: &[f64],
        order: ArimaOrder,
    ) -> Result<Box<dyn FittedModel>, ModelFitError>;
}

/// A fitted model able to extrapolate point estimates.
pub trait FittedModel {
    fn forecast(&self, steps: usize) -> Vec<f64>;
}

/// The `horizon` calendar days following `last`.
pub fn future_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    last.iter_days().skip(1).take(horizon).collect()
}

/// Fits `engine` to the series and pairs each estimate with the next calendar day.
pub fn forecast(
    series: &TimeSeries,
    horizon_days: usize,
    order: ArimaOrder,
    engine: &dyn ForecastingEngine,
) -> Result<ForecastResult, ModelFitError> {
    let last = series.last().ok_or(ModelFitError::EmptySeries)?.date;
    let values: Vec<f64> = series.values().collect();

    info!(
        "Fitting ARIMA{} on {} samples, forecasting {} days",
        order,
        values.len(),
        horizon_days
    );
    let model = engine.fit(&values, order)?;
    let estimates = model.forecast(horizon_days);
    let dates = future_dates(last, horizon_days);

    if estimates.len() != horizon_days || dates.len() != horizon_days {
        return Err(ModelFitError::ForecastLength {
            expected: horizon_days,
            actual: estimates.len().min(dates.len()),
        });
    }
    if estimates.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitError::Diverged);
    }

    Ok(ForecastResult {
        order,
        points: dates
            .into_iter()
            .zip(estimates)
            .map(|(date, value)| ForecastPoint { date, value })
            .collect(),
    })
}
