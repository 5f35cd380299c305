use crate::analyzer::{
    ForecastingEngine, MA_WINDOWS, MovingAverage, compute_moving_averages, compute_returns,
    compute_volume_series, fetch_fundamentals, forecast,
};
use crate::config::AppConfig;
use crate::model::{
    ArimaOrder, DataFetchError, ForecastResult, FundamentalsSnapshot, ModelFitError, Period,
    QuoteRequest, ReturnHorizon, ReturnWindow, TimeSeries,
};
use crate::normalizer::normalize_quotes;
use crate::source::MarketDataSource;
use serde::Serialize;
use tracing::{info, warn};

/// Everything one dashboard run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub ticker: String,
    pub period: Period,
    pub forecast_days: usize,
    pub order: ArimaOrder,
    pub ma_windows: Vec<usize>,
    pub horizons: Vec<ReturnHorizon>,
}

impl PipelineRequest {
    pub fn new(ticker: impl Into<String>, period: Period, forecast_days: usize) -> Self {
        Self {
            ticker: ticker.into(),
            period,
            forecast_days,
            order: ArimaOrder::DEFAULT,
            ma_windows: MA_WINDOWS.to_vec(),
            horizons: ReturnHorizon::defaults(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.ticker.clone(), config.period, config.forecast_days)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastSection {
    Ready(ForecastResult),
    Failed {
        #[serde(skip)]
        error: ModelFitError,
        reason: String,
    },
}

impl ForecastSection {
    pub fn result(&self) -> Option<&ForecastResult> {
        match self {
            ForecastSection::Ready(result) => Some(result),
            ForecastSection::Failed { .. } => None,
        }
    }
}

impl From<Result<ForecastResult, ModelFitError>> for ForecastSection {
    fn from(outcome: Result<ForecastResult, ModelFitError>) -> Self {
        match outcome {
            Ok(result) => ForecastSection::Ready(result),
            Err(error) => ForecastSection::Failed {
                reason: error.to_string(),
                error,
            },
        }
    }
}

/// Output of one pipeline run, handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub ticker: String,
    pub period: Period,
    pub close: TimeSeries,
    pub volume: TimeSeries,
    pub moving_averages: Vec<MovingAverage>,
    pub returns: Vec<ReturnWindow>,
    pub fundamentals: FundamentalsSnapshot,
    pub forecast: ForecastSection,
}

/// Fetches the base series and runs every computation over it.
///
/// A fetch failure (or an empty series) aborts the run. Fundamentals and
/// forecast failures are contained in their own report sections.
pub async fn run(
    source: &dyn MarketDataSource,
    engine: &dyn ForecastingEngine,
    req: &PipelineRequest,
) -> Result<DashboardReport, DataFetchError> {
    let quote_req = QuoteRequest {
        ticker: req.ticker.trim().to_string(),
        period: req.period,
    };
    info!("Running dashboard for {} ({})", quote_req.ticker, quote_req.period);

    let quotes = normalize_quotes(source.fetch_quotes(&quote_req).await?);
    if quotes.is_empty() {
        warn!("No usable quotes for {}", quote_req.ticker);
        return Err(DataFetchError::NoData {
            symbol: quote_req.ticker,
            period: quote_req.period,
        });
    }

    let close = TimeSeries::closes(&quotes)?;
    let volume = compute_volume_series(&quotes)?;
    let moving_averages = compute_moving_averages(&close, &req.ma_windows);
    let returns = compute_returns(&close, &req.horizons);

    let fundamentals = match source.fetch_fundamentals(&quote_req.ticker).await {
        Ok(snapshot) => fetch_fundamentals(&snapshot),
        Err(e) => {
            warn!("Fundamentals unavailable for {}: {}", quote_req.ticker, e);
            FundamentalsSnapshot::default()
        }
    };

    let forecast_section: ForecastSection =
        forecast(&close, req.forecast_days, req.order, engine).into();
    if let ForecastSection::Failed { reason, .. } = &forecast_section {
        warn!("Model training failed for {}: {}", quote_req.ticker, reason);
    }

    info!(
        "Dashboard ready for {}: {} sessions, last close {:.2}",
        quote_req.ticker,
        close.len(),
        close.last().map_or(0.0, |p| p.value)
    );

    Ok(DashboardReport {
        ticker: quote_req.ticker,
        period: quote_req.period,
        close,
        volume,
        moving_averages,
        returns,
        fundamentals,
        forecast: forecast_section,
    })
}
