use crate::config::DataSourceConfig;
use crate::model::{DataFetchError, ParserError, Quote, QuoteRequest};
use crate::parser::{Parser, YahooParser};
use crate::source::MarketDataSource;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const SUMMARY_MODULES: &str = "price,summaryProfile,summaryDetail,defaultKeyStatistics";

pub struct YahooSource {
    client: Client,
    base_url: Url,
    timeout_seconds: u64,
    parser: YahooParser,
}

impl YahooSource {
    pub fn new(cfg: &DataSourceConfig) -> Result<Self, DataFetchError> {
        let client = Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()
            .map_err(|e| DataFetchError::Http(e.to_string()))?;
        let base_url = Url::parse(&cfg.base_url).map_err(|e| {
            DataFetchError::Http(format!("invalid base URL '{}': {}", cfg.base_url, e))
        })?;

        Ok(Self {
            client,
            base_url,
            timeout_seconds: cfg.timeout_seconds,
            parser: YahooParser::new(),
        })
    }

    fn build_url(&self, prefix: &[&str], ticker: &str) -> Result<Url, DataFetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DataFetchError::Http(format!("cannot extend base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(prefix)
            .push(ticker.trim());
        Ok(url)
    }

    pub fn chart_url(&self, req: &QuoteRequest) -> Result<Url, DataFetchError> {
        let mut url = self.build_url(&["v8", "finance", "chart"], &req.ticker)?;
        url.query_pairs_mut()
            .append_pair("range", req.period.as_str())
            .append_pair("interval", "1d");
        Ok(url)
    }

    pub fn summary_url(&self, ticker: &str) -> Result<Url, DataFetchError> {
        let mut url = self.build_url(&["v10", "finance", "quoteSummary"], ticker)?;
        url.query_pairs_mut().append_pair("modules", SUMMARY_MODULES);
        Ok(url)
    }

    fn transport_error(&self, e: reqwest::Error) -> DataFetchError {
        if e.is_timeout() {
            DataFetchError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else {
            DataFetchError::Http(e.to_string())
        }
    }

    async fn get(&self, url: Url, symbol: &str) -> Result<String, DataFetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DataFetchError::InvalidSymbol {
                symbol: symbol.to_string(),
                reason: "not found (HTTP 404)".into(),
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            warn!("Yahoo responded [{}] for {}", status, symbol);
            return Err(DataFetchError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        Ok(body)
    }
}

/// Maps an upstream "Not Found" to an invalid-symbol error; everything else stays a parse error.
fn upstream_to_fetch_error(symbol: &str, err: ParserError) -> DataFetchError {
    match err {
        ParserError::Upstream { code, description } if code == "Not Found" => {
            DataFetchError::InvalidSymbol {
                symbol: symbol.to_string(),
                reason: description,
            }
        }
        other => DataFetchError::Parse(other),
    }
}

#[async_trait::async_trait]
impl MarketDataSource for YahooSource {
    async fn fetch_quotes(&self, req: &QuoteRequest) -> Result<Vec<Quote>, DataFetchError> {
        let symbol = req.ticker.trim();
        info!("Fetching {} of daily quotes for {}", req.period, symbol);

        let body = self.get(self.chart_url(req)?, symbol).await?;
        let quotes = self
            .parser
            .parse_quotes(&body)
            .map_err(|e| upstream_to_fetch_error(symbol, e))?;

        if quotes.is_empty() {
            return Err(DataFetchError::NoData {
                symbol: symbol.to_string(),
                period: req.period,
            });
        }

        info!("Fetched {} daily rows for {}", quotes.len(), symbol);
        Ok(quotes)
    }

    /// Requests go out without Yahoo's cookie/crumb pair. When the `quoteSummary`
    /// endpoint insists on one it answers 401, which surfaces as `Api` and the
    /// pipeline reports every fundamental as `N/A`.
    async fn fetch_fundamentals(
        &self,
        ticker: &str,
    ) -> Result<HashMap<String, Value>, DataFetchError> {
        let symbol = ticker.trim();
        info!("Fetching fundamentals for {}", symbol);

        let body = self.get(self.summary_url(symbol)?, symbol).await?;
        let snapshot = self
            .parser
            .parse_fundamentals(&body)
            .map_err(|e| upstream_to_fetch_error(symbol, e))?;

        debug!("Fundamentals for {}: {} keys", symbol, snapshot.len());
        Ok(snapshot)
    }
}
