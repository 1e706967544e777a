//! # MC Forecast - Monte Carlo Stock Price Forecasting
//!
//! A batch forecasting library that projects daily closing prices forward
//! with Geometric Brownian Motion and summarises the simulated outcomes.
//!
//! ## Overview
//!
//! For each ticker the pipeline:
//! - **Acquires** daily OHLCV history from Alpha Vantage, through a local
//!   cache and under the provider's per-minute and per-day quotas
//! - **Estimates** annual/daily drift and volatility from simple returns
//! - **Simulates** N price paths over T trading days from the last close
//! - **Analyses** the final-price distribution (moments, percentiles, VaR)
//!
//! ## Key Components
//!
//! - **Data**: `RateLimiter`, `DataCache`, `DataFetcher` with cache fallback
//! - **Estimator**: `SimulationParameters`
//! - **GBM**: `GbmSimulator`, `PricePathSet`
//! - **Risk**: `RiskReport`, `RiskStatistics`, `VarEstimate`
//! - **Bundle**: `MonteCarloSimulator` producing a `SimulationResult`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mc_forecast::prelude::*;
//!
//! let config = AppConfig::load("config/simulation.yaml").unwrap();
//! let fetcher = DataFetcher::new("data", &config.data).unwrap();
//!
//! let outcome = fetcher.fetch_ticker_data("AAPL", Period::TwoYears, false).unwrap();
//! if let Some(series) = outcome.into_series() {
//!     let result = MonteCarloSimulator::new(42)
//!         .run(&series, 252, 10_000, &[0.05, 0.95])
//!         .unwrap();
//!     println!("mean final price: {:.2}", result.statistics.mean);
//! }
//! ```
//!
//! ## What This Library Does NOT Do
//!
//! - Model jumps, regime changes or stochastic volatility
//! - Account for dividends or corporate actions beyond the provider's data
//! - Render plots or upload results anywhere

pub mod core;
pub mod data;
pub mod models;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        AppConfig, DataConfig, ForecastError, ForecastResult, OhlcvBar, Period, RawFrame,
        SimulationConfig, TimeSeries,
    };

    // Data acquisition
    pub use crate::data::{
        validate, AlphaVantageClient, CacheConfig, DataCache, DataFetcher, FetchOutcome,
        MarketDataProvider, OutputSize, RateLimiter, TickerInfo,
    };

    // Models
    pub use crate::models::{
        daily_returns, GbmSimulator, MonteCarloSimulator, PricePathSet, RiskReport,
        RiskStatistics, SimulationParameters, SimulationResult, VarEstimate,
    };
}

// Re-export main types at crate root
pub use crate::core::{ForecastError, ForecastResult};
pub use crate::models::{MonteCarloSimulator, SimulationResult};
