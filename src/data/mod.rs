//! Data fetching and storage
//!
//! Handles:
//! - Alpha Vantage API for daily OHLCV history
//! - Per-minute and per-day API quotas
//! - Local caching and schema validation

pub mod alpha_vantage;
pub mod cache;
pub mod fetcher;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod provider;
pub mod rate_limit;

pub use alpha_vantage::*;
pub use cache::*;
pub use fetcher::*;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockProvider;
pub use provider::*;
pub use rate_limit::*;
