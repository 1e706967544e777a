//! Drift and volatility estimation
//!
//! Parameters come from simple daily returns of the Close series:
//!
//! r_t = C_t / C_{t-1} - 1
//!
//! annualised with the usual 252 trading days per year:
//! - annual drift μ_a = mean(r) · 252
//! - annual volatility σ_a = std(r) · √252 (sample standard deviation)
//!
//! and converted back to the per-day values the path simulator steps with.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::core::{ForecastError, ForecastResult};

/// Trading days per year
pub const TRADING_DAYS: f64 = 252.0;

/// GBM parameters derived from history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub annual_drift: f64,
    pub annual_volatility: f64,
    pub daily_drift: f64,
    pub daily_volatility: f64,
}

impl SimulationParameters {
    /// Estimate from daily returns; needs at least two observations
    pub fn estimate(returns: &[f64]) -> ForecastResult<Self> {
        if returns.len() < 2 {
            return Err(ForecastError::InsufficientData {
                rows: returns.len(),
                required: 2,
            });
        }

        let annual_drift = returns.iter().mean() * TRADING_DAYS;
        let annual_volatility = returns.iter().std_dev() * TRADING_DAYS.sqrt();

        if !annual_drift.is_finite() || !annual_volatility.is_finite() {
            return Err(ForecastError::invalid_input(
                "returns contain non-finite values",
            ));
        }

        Ok(Self {
            annual_drift,
            annual_volatility,
            daily_drift: annual_drift / TRADING_DAYS,
            daily_volatility: annual_volatility / TRADING_DAYS.sqrt(),
        })
    }

    /// Estimate straight from a price series
    pub fn from_prices(prices: &[f64]) -> ForecastResult<Self> {
        Self::estimate(&daily_returns(prices))
    }
}

/// Simple percentage change between consecutive prices. The first,
/// undefined observation is dropped, so the result is one shorter.
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}
