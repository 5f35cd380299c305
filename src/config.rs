use crate::model::{ConfigError, Period};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const MIN_FORECAST_DAYS: usize = 5;
pub const MAX_FORECAST_DAYS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_ticker")]
    pub ticker: String,
    #[serde(default = "default_period")]
    pub period: Period,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: usize,
    #[serde(default)]
    pub output: OutputFormat,
    #[serde(default)]
    pub data_source: DataSourceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ticker: default_ticker(),
            period: default_period(),
            forecast_days: default_forecast_days(),
            output: OutputFormat::default(),
            data_source: DataSourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Checks the ranges serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "ticker",
                message: "must not be empty".into(),
            });
        }
        if !(MIN_FORECAST_DAYS..=MAX_FORECAST_DAYS).contains(&self.forecast_days) {
            return Err(ConfigError::Invalid {
                field: "forecast_days",
                message: format!(
                    "{} is outside {}..={}",
                    self.forecast_days, MIN_FORECAST_DAYS, MAX_FORECAST_DAYS
                ),
            });
        }
        if self.data_source.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "data_source.timeout_seconds",
                message: "must be positive".into(),
            });
        }
        if !self.data_source.base_url.starts_with("http") {
            return Err(ConfigError::Invalid {
                field: "data_source.base_url",
                message: format!("'{}' is not an http(s) URL", self.data_source.base_url),
            });
        }
        Ok(())
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

fn default_ticker() -> String {
    "ITC.NS".to_string()
}

fn default_period() -> Period {
    Period::OneYear
}

fn default_forecast_days() -> usize {
    15
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) StockDashboard/0.1".to_string()
}
