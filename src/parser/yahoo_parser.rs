// Yahoo Finance JSON decoding
use crate::model::{ParserError, Quote};
use crate::utils::date_from_unix;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub trait Parser {
    fn parse_quotes(&self, body: &str) -> Result<Vec<Quote>, ParserError>;
    fn parse_fundamentals(&self, body: &str) -> Result<HashMap<String, Value>, ParserError>;
}

pub struct YahooParser;

impl YahooParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YahooParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<Map<String, Value>>>,
    error: Option<UpstreamError>,
}

fn cell(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

impl Parser for YahooParser {
    /// Decodes a `/v8/finance/chart` payload. Rows without a close are skipped.
    fn parse_quotes(&self, body: &str) -> Result<Vec<Quote>, ParserError> {
        let envelope: ChartEnvelope = serde_json::from_str(body)?;

        let result = match (envelope.chart.result, envelope.chart.error) {
            (_, Some(err)) => {
                return Err(ParserError::Upstream {
                    code: err.code,
                    description: err.description,
                });
            }
            (Some(mut results), None) if !results.is_empty() => results.swap_remove(0),
            _ => return Err(ParserError::MissingField("chart.result".into())),
        };

        if result.timestamp.is_empty() {
            return Ok(Vec::new());
        }

        let columns = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| ParserError::MissingField("indicators.quote".into()))?;

        if columns.close.len() != result.timestamp.len() {
            return Err(ParserError::LengthMismatch {
                field: "close",
                expected: result.timestamp.len(),
                actual: columns.close.len(),
            });
        }

        let mut quotes = Vec::with_capacity(result.timestamp.len());
        for (i, &ts) in result.timestamp.iter().enumerate() {
            let Some(close) = cell(&columns.close, i) else {
                continue;
            };
            let date = date_from_unix(ts, result.meta.gmtoffset)
                .ok_or(ParserError::InvalidTimestamp(ts))?;

            quotes.push(Quote {
                date,
                open: cell(&columns.open, i).unwrap_or(close),
                high: cell(&columns.high, i).unwrap_or(close),
                low: cell(&columns.low, i).unwrap_or(close),
                close,
                volume: cell(&columns.volume, i).map_or(0, |v| v.max(0.0) as u64),
            });
        }

        Ok(quotes)
    }

    /// Flattens the modules of a `/v10/finance/quoteSummary` payload into one key/value map.
    /// `{"raw": .., "fmt": ..}` wrappers collapse to the raw value, empty objects are dropped.
    fn parse_fundamentals(&self, body: &str) -> Result<HashMap<String, Value>, ParserError> {
        let envelope: SummaryEnvelope = serde_json::from_str(body)?;

        let modules = match (envelope.quote_summary.result, envelope.quote_summary.error) {
            (_, Some(err)) => {
                return Err(ParserError::Upstream {
                    code: err.code,
                    description: err.description,
                });
            }
            (Some(mut results), None) if !results.is_empty() => results.swap_remove(0),
            _ => return Err(ParserError::MissingField("quoteSummary.result".into())),
        };

        let mut snapshot = HashMap::new();
        for (_, module) in modules {
            let Value::Object(fields) = module else {
                continue;
            };
            for (key, value) in fields {
                let value = match value {
                    Value::Object(mut obj) => match obj.remove("raw") {
                        Some(raw) => raw,
                        None if obj.is_empty() => continue,
                        None => Value::Object(obj),
                    },
                    Value::Null => continue,
                    other => other,
                };
                snapshot.entry(key).or_insert(value);
            }
        }

        Ok(snapshot)
    }
}
