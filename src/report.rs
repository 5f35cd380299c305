// Presentation: text tables and JSON for a finished dashboard run
use crate::model::NOT_AVAILABLE;
use crate::pipeline::{DashboardReport, ForecastSection};
use crate::utils::mean;
use std::fmt;

impl DashboardReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Average of all volume samples.
    pub fn average_volume(&self) -> Option<f64> {
        mean(&self.volume.values().collect::<Vec<_>>())
    }
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Stock Market Dashboard: {} ({}, {} sessions)",
            self.ticker,
            self.period,
            self.close.len()
        )?;

        writeln!(f, "\nPrice Chart")?;
        if let (Some(first), Some(last)) = (self.close.first(), self.close.last()) {
            writeln!(f, "  {:<14}{}  {:.2}", "First close", first.date, first.value)?;
            writeln!(f, "  {:<14}{}  {:.2}", "Last close", last.date, last.value)?;
        }

        writeln!(f, "\nMoving Averages (MA)")?;
        for ma in &self.moving_averages {
            match ma.series.last() {
                Some(p) => writeln!(f, "  {:<14}{:.2}", ma.label(), p.value)?,
                None => writeln!(f, "  {:<14}{}", ma.label(), NOT_AVAILABLE)?,
            }
        }

        writeln!(f, "\nFundamental Data")?;
        writeln!(f, "  {:<14}{}", "Metric", "Value")?;
        for (metric, value) in self.fundamentals.rows() {
            writeln!(f, "  {:<14}{}", metric, value)?;
        }

        writeln!(f, "\nReturns Calculator")?;
        writeln!(f, "  {:<14}{}", "Period", "Return (%)")?;
        for r in &self.returns {
            writeln!(f, "  {:<14}{:.2}", r.label, r.percent)?;
        }

        writeln!(f, "\nVolume Trend")?;
        if let Some(last) = self.volume.last() {
            writeln!(f, "  {:<14}{:.0}", "Latest", last.value)?;
        }
        if let Some(avg) = self.average_volume() {
            writeln!(f, "  {:<14}{:.0}", "Average", avg)?;
        }

        match &self.forecast {
            ForecastSection::Ready(result) => {
                writeln!(
                    f,
                    "\nForecast for next {} days (ARIMA{})",
                    result.len(),
                    result.order
                )?;
                writeln!(f, "  {:<14}{}", "Date", "Predicted Price")?;
                for p in &result.points {
                    writeln!(f, "  {:<14}{:.2}", p.date.to_string(), p.value)?;
                }
            }
            ForecastSection::Failed { reason, .. } => {
                writeln!(f, "\nForecast")?;
                writeln!(f, "  Model training failed: {}", reason)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{MovingAverage, compute_moving_averages, compute_returns};
    use crate::model::{
        ArimaOrder, ForecastPoint, ForecastResult, FundamentalValue, FundamentalsSnapshot,
        ModelFitError, Period, ReturnHorizon, TimeSeries,
    };
    use chrono::{Days, NaiveDate};

    fn report(forecast: ForecastSection) -> DashboardReport {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let close = TimeSeries::from_pairs(
            [100.0, 102.0, 101.0, 105.0, 107.0]
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + Days::new(i as u64), v)),
        )
        .unwrap();
        let volume = TimeSeries::from_pairs(close.dates().map(|d| (d, 1_000.0))).unwrap();
        let moving_averages: Vec<MovingAverage> = compute_moving_averages(&close, &[3, 20]);
        let returns = compute_returns(&close, &ReturnHorizon::defaults());

        DashboardReport {
            ticker: "ITC.NS".into(),
            period: Period::OneMonth,
            close,
            volume,
            moving_averages,
            returns,
            fundamentals: FundamentalsSnapshot {
                company: FundamentalValue::Text("ITC Limited".into()),
                ..FundamentalsSnapshot::default()
            },
            forecast,
        }
    }

    #[test]
    fn test_text_report_sections() {
        let forecast = ForecastSection::Ready(ForecastResult {
            order: ArimaOrder::DEFAULT,
            points: vec![ForecastPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
                value: 108.25,
            }],
        });
        let text = report(forecast).to_string();

        assert!(text.contains("ITC.NS (1mo, 5 sessions)"));
        assert!(text.contains("3-Day MA"));
        assert!(text.contains("104.33"));
        assert!(text.contains("20-Day MA     N/A"));
        assert!(text.contains("Company       ITC Limited"));
        assert!(text.contains("Sector        N/A"));
        assert!(text.contains("1 Day         1.90"));
        assert!(text.contains("1 Month       0.00"));
        assert!(text.contains("Forecast for next 1 days (ARIMA(5,1,2))"));
        assert!(text.contains("2024-01-06    108.25"));
    }

    #[test]
    fn test_text_report_failed_forecast() {
        let text = report(Err(ModelFitError::Constant).into()).to_string();
        assert!(text.contains("Model training failed: series is constant after differencing"));
        assert!(text.contains("Returns Calculator"));
    }

    #[test]
    fn test_json_report() {
        let json = report(Err(ModelFitError::Singular).into()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["ticker"], "ITC.NS");
        assert_eq!(value["period"], "1mo");
        assert_eq!(value["close"].as_array().unwrap().len(), 5);
        assert_eq!(value["close"][0]["date"], "2024-01-01");
        assert_eq!(value["fundamentals"]["sector"], "N/A");
        assert_eq!(value["returns"][1]["defined"], false);
        assert_eq!(value["forecast"]["status"], "failed");
        assert!(value["forecast"].get("error").is_none());
    }

    #[test]
    fn test_average_volume() {
        assert_eq!(report(Err(ModelFitError::Singular).into()).average_volume(), Some(1_000.0));
    }
}
