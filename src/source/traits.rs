use crate::model::{DataFetchError, Quote, QuoteRequest};
use serde_json::Value;
use std::collections::HashMap;

/// Remote provider of daily quotes and point-in-time fundamentals.
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily quotes for the requested ticker and period, oldest first.
    async fn fetch_quotes(&self, req: &QuoteRequest) -> Result<Vec<Quote>, DataFetchError>;

    /// Raw key/value fundamentals snapshot (e.g. `longName`, `trailingPE`).
    async fn fetch_fundamentals(&self, ticker: &str)
    -> Result<HashMap<String, Value>, DataFetchError>;
}
