use crate::model::{FundamentalValue, FundamentalsSnapshot};
use serde_json::Value;
use std::collections::HashMap;

fn field(snapshot: &HashMap<String, Value>, key: &str) -> FundamentalValue {
    match snapshot.get(key) {
        None | Some(Value::Null) => FundamentalValue::NotAvailable,
        Some(Value::String(s)) if s.trim().is_empty() => FundamentalValue::NotAvailable,
        Some(Value::String(s)) => FundamentalValue::Text(s.clone()),
        Some(Value::Number(n)) => n
            .as_f64()
            .map_or(FundamentalValue::NotAvailable, FundamentalValue::Number),
        Some(other) => FundamentalValue::Text(other.to_string()),
    }
}

/// Projects a raw key/value snapshot onto the fixed fundamentals shape.
/// Missing keys become `N/A`.
pub fn fetch_fundamentals(snapshot: &HashMap<String, Value>) -> FundamentalsSnapshot {
    FundamentalsSnapshot {
        company: field(snapshot, "longName"),
        sector: field(snapshot, "sector"),
        industry: field(snapshot, "industry"),
        market_cap: field(snapshot, "marketCap"),
        pe_ratio: field(snapshot, "trailingPE"),
        pb_ratio: field(snapshot, "priceToBook"),
        fifty_two_week_high: field(snapshot, "fiftyTwoWeekHigh"),
        fifty_two_week_low: field(snapshot, "fiftyTwoWeekLow"),
    }
}
