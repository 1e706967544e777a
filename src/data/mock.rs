//! Scripted provider for tests
//!
//! Compiled for this crate's unit tests and, for downstream crates, behind
//! the `test-util` feature.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::provider::{MarketDataProvider, OutputSize};
use crate::core::{ForecastError, ForecastResult, RawFrame};

/// Scripted provider for tests.
///
/// Daily-series responses are served in the order they were queued; every
/// request is recorded.
#[derive(Default)]
pub struct MockProvider {
    series: Mutex<VecDeque<ForecastResult<RawFrame>>>,
    overview: Mutex<Option<HashMap<String, String>>>,
    requests: Mutex<Vec<(String, OutputSize)>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_series(&self, response: ForecastResult<RawFrame>) -> &Self {
        if let Ok(mut queue) = self.series.lock() {
            queue.push_back(response);
        }
        self
    }

    pub fn set_overview(&self, fields: HashMap<String, String>) {
        if let Ok(mut overview) = self.overview.lock() {
            *overview = Some(fields);
        }
    }

    /// Daily-series requests received so far
    pub fn requests(&self) -> Vec<(String, OutputSize)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl MarketDataProvider for MockProvider {
    fn get_daily_series(&self, symbol: &str, size: OutputSize) -> ForecastResult<RawFrame> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((symbol.to_string(), size));
        }

        self.series
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| Ok(RawFrame::default()))
    }

    fn get_company_overview(&self, symbol: &str) -> ForecastResult<HashMap<String, String>> {
        self.overview
            .lock()
            .ok()
            .and_then(|o| o.clone())
            .ok_or_else(|| ForecastError::provider(format!("No overview scripted for {}", symbol)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_serves_in_order() {
        let mock = MockProvider::new();
        mock.push_series(Err(ForecastError::provider("down")))
            .push_series(Ok(RawFrame::new(vec!["Close".into()])));

        assert!(mock.get_daily_series("AAA", OutputSize::Full).is_err());
        let frame = mock.get_daily_series("AAA", OutputSize::Compact).unwrap();
        assert!(frame.has_column("Close"));
        // Exhausted queue answers with an empty frame
        assert!(mock.get_daily_series("AAA", OutputSize::Compact).unwrap().is_empty());

        assert_eq!(
            mock.requests(),
            vec![
                ("AAA".to_string(), OutputSize::Full),
                ("AAA".to_string(), OutputSize::Compact),
                ("AAA".to_string(), OutputSize::Compact),
            ]
        );
    }
}
