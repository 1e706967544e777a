//! Market data provider capability
//!
//! The acquisition layer only needs two calls from a provider. Anything that
//! can answer them (a live HTTP client, a recorded fixture, a scripted mock)
//! plugs in without touching the fetch logic.

use std::collections::HashMap;
use std::fmt;

use crate::core::{ForecastResult, RawFrame};

/// How much history to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputSize {
    /// Latest ~100 data points
    Compact,
    /// Full available history
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of daily OHLCV history and company metadata
pub trait MarketDataProvider: Send + Sync {
    /// Daily rows for `symbol`. An empty frame means the provider had nothing
    /// to return; transport and API failures are errors.
    fn get_daily_series(&self, symbol: &str, size: OutputSize) -> ForecastResult<RawFrame>;

    /// Free-form company fields keyed by the provider's field names
    fn get_company_overview(&self, symbol: &str) -> ForecastResult<HashMap<String, String>>;
}
