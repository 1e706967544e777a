//! Alpha Vantage data fetcher
//!
//! Daily OHLCV history (`TIME_SERIES_DAILY`) and company overviews
//! (`OVERVIEW`) over Alpha Vantage's REST API.
//!
//! Note: the free tier allows a handful of calls per minute and per day. The
//! client itself does not throttle; callers go through `RateLimiter`.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use super::provider::{MarketDataProvider, OutputSize};
use crate::core::{ForecastError, ForecastResult, RawFrame, PROVIDER_COLUMNS};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage API client
pub struct AlphaVantageClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: impl Into<String>) -> ForecastResult<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> ForecastResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("mc-forecast/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ForecastError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn query(&self, params: &[(&str, &str)]) -> ForecastResult<Value> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("apikey", self.api_key.as_str()));

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .map_err(|e| ForecastError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| ForecastError::provider(e.to_string()))?;

        let body: Value = response
            .json()
            .map_err(|e| ForecastError::provider(format!("Failed to parse response: {}", e)))?;

        check_api_message(&body)?;
        Ok(body)
    }
}

impl MarketDataProvider for AlphaVantageClient {
    fn get_daily_series(&self, symbol: &str, size: OutputSize) -> ForecastResult<RawFrame> {
        let body = self.query(&[
            ("function", "TIME_SERIES_DAILY"),
            ("symbol", symbol),
            ("outputsize", size.as_str()),
            ("datatype", "json"),
        ])?;
        parse_daily_series(body)
    }

    fn get_company_overview(&self, symbol: &str) -> ForecastResult<HashMap<String, String>> {
        let body = self.query(&[("function", "OVERVIEW"), ("symbol", symbol)])?;
        Ok(parse_overview(body))
    }
}

/// Alpha Vantage reports quota and argument problems as 200 responses with a
/// single message field.
fn check_api_message(body: &Value) -> ForecastResult<()> {
    for key in ["Error Message", "Note", "Information"] {
        if let Some(msg) = body.get(key).and_then(Value::as_str) {
            return Err(ForecastError::provider(format!("{}: {}", key, msg)));
        }
    }
    Ok(())
}

// Alpha Vantage API response structures

#[derive(Debug, Deserialize)]
struct DailySeriesResponse {
    #[serde(rename = "Time Series (Daily)", default)]
    series: BTreeMap<String, BTreeMap<String, String>>,
}

/// Convert a daily-series payload into a frame with the provider's own
/// column names. Rows come out in ascending date order.
fn parse_daily_series(body: Value) -> ForecastResult<RawFrame> {
    let response: DailySeriesResponse = serde_json::from_value(body)?;

    let columns: Vec<String> = PROVIDER_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut frame = RawFrame::new(columns.clone());

    for (date, fields) in response.series {
        let date = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Skipping row with unparseable date '{}': {}", date, e);
                continue;
            }
        };
        let values = columns
            .iter()
            .map(|c| fields.get(c).and_then(|v| v.trim().parse::<f64>().ok()))
            .collect();
        frame.push(date, values);
    }

    Ok(frame)
}

fn parse_overview(body: Value) -> HashMap<String, String> {
    match body {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect(),
        _ => HashMap::new(),
    }
}
