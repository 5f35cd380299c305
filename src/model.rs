// Core structs: Quote, TimeSeries, ReturnWindow, ForecastResult, FundamentalsSnapshot
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel shown for any fundamentals field the data source did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// One daily OHLCV row as returned by the market data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered single-channel series. Dates are strictly increasing.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct TimeSeries {
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    pub fn new(points: Vec<SeriesPoint>) -> Result<Self, SeriesError> {
        if let Some(i) = points.windows(2).position(|w| w[1].date <= w[0].date) {
            return Err(SeriesError::NotIncreasing {
                previous: points[i].date,
                next: points[i + 1].date,
            });
        }
        Ok(Self { points })
    }

    /// For points taken in order from an already valid series.
    pub(crate) fn from_ordered(points: Vec<SeriesPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, value)| SeriesPoint { date, value })
                .collect(),
        )
    }

    /// Close projection of an ordered quote sequence.
    pub fn closes(quotes: &[Quote]) -> Result<Self, SeriesError> {
        Self::from_pairs(quotes.iter().map(|q| (q.date, q.close)))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&SeriesPoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn to_pairs(&self) -> Vec<(NaiveDate, f64)> {
        self.points.iter().map(|p| (p.date, p.value)).collect()
    }
}

/// History window requested from the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ConfigError::Invalid {
                field: "period",
                message: format!("unknown period '{}'", s),
            })
    }
}

/// Named lookback used by the returns calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnHorizon {
    pub label: String,
    pub lookback: usize,
}

impl ReturnHorizon {
    pub fn new(label: impl Into<String>, lookback: usize) -> Self {
        Self {
            label: label.into(),
            lookback,
        }
    }

    /// "1 Day", "1 Week" and "1 Month" in trading samples.
    pub fn defaults() -> Vec<ReturnHorizon> {
        vec![
            ReturnHorizon::new("1 Day", 1),
            ReturnHorizon::new("1 Week", 5),
            ReturnHorizon::new("1 Month", 22),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnWindow {
    pub label: String,
    pub lookback: usize,
    /// Percentage change, or 0.0 when `defined` is false.
    pub percent: f64,
    pub defined: bool,
}

/// (p, d, q) order of an ARIMA model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const DEFAULT: ArimaOrder = ArimaOrder { p: 5, d: 1, q: 2 };

    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub order: ArimaOrder,
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A single fundamentals metric.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FundamentalValue {
    Text(String),
    Number(f64),
    #[default]
    NotAvailable,
}

impl FundamentalValue {
    pub fn is_available(&self) -> bool {
        !matches!(self, FundamentalValue::NotAvailable)
    }
}

impl fmt::Display for FundamentalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundamentalValue::Text(s) => f.write_str(s),
            FundamentalValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{:.0}", n)
            }
            FundamentalValue::Number(n) => write!(f, "{:.2}", n),
            FundamentalValue::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for FundamentalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FundamentalValue::Text(s) => serializer.serialize_str(s),
            FundamentalValue::Number(n) => serializer.serialize_f64(*n),
            FundamentalValue::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FundamentalsSnapshot {
    pub company: FundamentalValue,
    pub sector: FundamentalValue,
    pub industry: FundamentalValue,
    pub market_cap: FundamentalValue,
    pub pe_ratio: FundamentalValue,
    pub pb_ratio: FundamentalValue,
    pub fifty_two_week_high: FundamentalValue,
    pub fifty_two_week_low: FundamentalValue,
}

impl FundamentalsSnapshot {
    /// Metric/value rows in display order.
    pub fn rows(&self) -> [(&'static str, &FundamentalValue); 8] {
        [
            ("Company", &self.company),
            ("Sector", &self.sector),
            ("Industry", &self.industry),
            ("Market Cap", &self.market_cap),
            ("PE Ratio", &self.pe_ratio),
            ("PB Ratio", &self.pb_ratio),
            ("52 Week High", &self.fifty_two_week_high),
            ("52 Week Low", &self.fifty_two_week_low),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub ticker: String,
    pub period: Period,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("dates must be strictly increasing: {next} follows {previous}")]
    NotIncreasing { previous: NaiveDate, next: NaiveDate },
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("upstream error {code}: {description}")]
    Upstream { code: String, description: String },
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
    #[error("column '{field}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Failure to obtain the base series. Terminal for the whole pipeline.
#[derive(Debug, Error)]
pub enum DataFetchError {
    #[error("invalid symbol '{symbol}': {reason}")]
    InvalidSymbol { symbol: String, reason: String },
    #[error("no data found for '{symbol}' over {period}")]
    NoData { symbol: String, period: Period },
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Parse(#[from] ParserError),
    #[error("source returned an unordered series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

impl DataFetchError {
    /// True when the caller's input (symbol/period) is at fault rather than the network
    /// or upstream.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DataFetchError::InvalidSymbol { .. } | DataFetchError::NoData { .. }
        )
    }
}

/// Failure of the forecasting step. Terminal for the forecast only.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelFitError {
    #[error("cannot fit a model to an empty series")]
    EmptySeries,
    #[error("series too short for order {order}: need {required} samples, got {actual}")]
    TooShort {
        order: ArimaOrder,
        required: usize,
        actual: usize,
    },
    #[error("series contains non-finite values")]
    NonFinite,
    #[error("series is constant after differencing")]
    Constant,
    #[error("regression is singular, model did not converge")]
    Singular,
    #[error("model produced non-finite estimates")]
    Diverged,
    #[error("autoregressive part is not stationary")]
    NonStationary,
    #[error("moving-average part is not invertible")]
    NonInvertible,
    #[error("engine returned {actual} estimates, expected {expected}")]
    ForecastLength { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config field '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}
