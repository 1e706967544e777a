//! Cache-backed data acquisition
//!
//! Produces one validated series per (ticker, period) request by combining
//! the local cache, the rate limiter and a market data provider. The route a
//! request takes is an explicit state (`FetchState`) chosen by two pure
//! transition functions, so each branch can be exercised on its own:
//!
//! | state                  | result                                  |
//! |------------------------|-----------------------------------------|
//! | `CacheFresh`           | cached series                           |
//! | `StaleNoCredential`    | cached series, whatever its age         |
//! | `NoCredentialNoCache`  | `Configuration` error                   |
//! | `Fetch`                | live fetch, then one of the three below |
//! | `FetchSuccess`         | fresh series, written to the cache      |
//! | `FetchFailWithFallback`| cached series, whatever its age         |
//! | `FetchFailNoFallback`  | no data; the caller skips the ticker    |

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;

use super::alpha_vantage::AlphaVantageClient;
use super::cache::{validate, CacheConfig, CacheInfo, DataCache};
use super::provider::{MarketDataProvider, OutputSize};
use super::rate_limit::RateLimiter;
use crate::core::{
    DataConfig, ForecastError, ForecastResult, Period, RawFrame, TimeSeries, API_KEY_ENV, MIN_ROWS,
};

/// Decision points of a single acquisition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    CacheFresh,
    StaleNoCredential,
    NoCredentialNoCache,
    Fetch,
    FetchSuccess,
    FetchFailWithFallback,
    FetchFailNoFallback,
}

/// What is known before any provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheProbe {
    pub force_refresh: bool,
    /// Fresh metadata and a readable data file
    pub cache_fresh: bool,
    /// Any readable data file, fresh or stale
    pub cache_present: bool,
    pub has_credential: bool,
}

impl FetchState {
    /// Route taken before contacting the provider
    pub fn initial(probe: CacheProbe) -> Self {
        if !probe.force_refresh && probe.cache_fresh {
            FetchState::CacheFresh
        } else if !probe.has_credential {
            if probe.cache_present {
                FetchState::StaleNoCredential
            } else {
                FetchState::NoCredentialNoCache
            }
        } else {
            FetchState::Fetch
        }
    }

    /// Route taken once the live fetch has finished
    pub fn after_fetch(fetched: bool, cache_present: bool) -> Self {
        match (fetched, cache_present) {
            (true, _) => FetchState::FetchSuccess,
            (false, true) => FetchState::FetchFailWithFallback,
            (false, false) => FetchState::FetchFailNoFallback,
        }
    }
}

/// Result of an acquisition request
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Fetched from the provider during this request
    Fresh(TimeSeries),
    /// Served from the local cache
    Cached(TimeSeries),
    /// Nothing usable; not fatal for a batch
    NoData,
}

impl FetchOutcome {
    pub fn series(&self) -> Option<&TimeSeries> {
        match self {
            FetchOutcome::Fresh(s) | FetchOutcome::Cached(s) => Some(s),
            FetchOutcome::NoData => None,
        }
    }

    pub fn into_series(self) -> Option<TimeSeries> {
        match self {
            FetchOutcome::Fresh(s) | FetchOutcome::Cached(s) => Some(s),
            FetchOutcome::NoData => None,
        }
    }

    pub fn is_from_cache(&self) -> bool {
        matches!(self, FetchOutcome::Cached(_))
    }
}

/// Basic company description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerInfo {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub market_cap: f64,
    pub currency: String,
    pub exchange: String,
    pub description: String,
}

impl TickerInfo {
    fn from_overview(symbol: &str, fields: &HashMap<String, String>) -> Self {
        let text = |key: &str, default: &str| {
            fields
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            symbol: symbol.to_string(),
            name: text("Name", "N/A"),
            sector: text("Sector", "N/A"),
            industry: text("Industry", "N/A"),
            market_cap: fields
                .get("MarketCapitalization")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0),
            currency: text("Currency", "USD"),
            exchange: text("Exchange", "N/A"),
            description: text("Description", "N/A"),
        }
    }
}

/// Cache summary plus today's API usage
#[derive(Debug, Clone, Serialize)]
pub struct FetcherInfo {
    #[serde(flatten)]
    pub cache: CacheInfo,
    pub api_calls_today: Option<u32>,
    pub daily_limit: Option<u32>,
}

/// Provider plus the limiter guarding it
struct LiveSource {
    provider: Arc<dyn MarketDataProvider>,
    limiter: RateLimiter,
}

/// Cache-backed fetcher for daily price history
pub struct DataFetcher {
    cache: DataCache,
    live: Option<LiveSource>,
}

impl DataFetcher {
    /// Build from configuration. Without a resolvable credential the fetcher
    /// only serves cached data.
    pub fn new(cache_dir: impl Into<PathBuf>, config: &DataConfig) -> ForecastResult<Self> {
        let cache = DataCache::new(CacheConfig {
            cache_dir: cache_dir.into(),
            cache_duration_days: config.cache_duration_days,
        })?;

        match config.api_key() {
            Some(key) => {
                let client = AlphaVantageClient::new(key)?;
                let limiter = RateLimiter::new(config.api_rate_limit_per_minute, config.api_daily_limit);
                tracing::info!(
                    "Initialized Alpha Vantage client with rate limit: {}/min, {}/day",
                    limiter.calls_per_minute(),
                    limiter.daily_limit()
                );
                Ok(Self::with_provider(cache, Arc::new(client), limiter))
            }
            None => {
                tracing::info!("No API key provided - will use cached data only if available");
                Ok(Self::offline(cache))
            }
        }
    }

    pub fn with_provider(
        cache: DataCache,
        provider: Arc<dyn MarketDataProvider>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            cache,
            live: Some(LiveSource { provider, limiter }),
        }
    }

    /// Cache-only fetcher
    pub fn offline(cache: DataCache) -> Self {
        Self { cache, live: None }
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn has_credential(&self) -> bool {
        self.live.is_some()
    }

    /// Fetch a ticker's history, preferring a fresh cache entry.
    ///
    /// Provider failures fall back to whatever is cached; when nothing is,
    /// the outcome is `NoData` rather than an error. Errors are reserved for
    /// a missing credential with an empty cache, and for a fresh cache entry
    /// that does not validate.
    pub fn fetch_ticker_data(
        &self,
        ticker: &str,
        period: Period,
        force_refresh: bool,
    ) -> ForecastResult<FetchOutcome> {
        let ticker = ticker.to_uppercase();
        tracing::info!("Fetching data for {} (period: {})", ticker, period);

        let cache_valid = self.cache.is_valid(&ticker, period);
        let cached = self.cache.load(&ticker, period);

        let probe = CacheProbe {
            force_refresh,
            cache_fresh: cache_valid && cached.is_some(),
            cache_present: cached.is_some(),
            has_credential: self.has_credential(),
        };

        let state = FetchState::initial(probe);
        tracing::debug!("{}: {:?}", ticker, state);

        match (state, &self.live) {
            (FetchState::CacheFresh, _) | (FetchState::StaleNoCredential, _) => {
                if state == FetchState::StaleNoCredential {
                    tracing::info!("Using expired cached data for {} (no API key available)", ticker);
                }
                let frame = cached.ok_or_else(|| ForecastError::no_data(ticker.clone()))?;
                Ok(FetchOutcome::Cached(validate(&ticker, &frame)?))
            }
            (FetchState::Fetch, Some(live)) => {
                let fetched = self.fetch_live(live, &ticker, period);
                let next = FetchState::after_fetch(fetched.is_ok(), cached.is_some());
                tracing::debug!("{}: {:?}", ticker, next);

                match fetched {
                    Ok(series) => Ok(FetchOutcome::Fresh(series)),
                    Err(e) => {
                        tracing::warn!("Error fetching data for {}: {}", ticker, e);
                        Ok(self.fallback(&ticker, next, cached.as_ref()))
                    }
                }
            }
            _ => Err(ForecastError::configuration(format!(
                "No API key provided and no cached data available for {}. Set {} or configure \
                 data.alpha_vantage_api_key, or ensure cached data exists.",
                ticker, API_KEY_ENV
            ))),
        }
    }

    /// Live path: at most two provider calls, each behind a limiter slot
    fn fetch_live(&self, live: &LiveSource, ticker: &str, period: Period) -> ForecastResult<TimeSeries> {
        tracing::info!("Downloading fresh data for {}...", ticker);

        live.limiter.acquire()?;
        let size = if period.is_long_horizon() {
            OutputSize::Full
        } else {
            OutputSize::Compact
        };
        let mut frame = live.provider.get_daily_series(ticker, size)?;

        if frame.is_empty() && size == OutputSize::Full {
            tracing::info!("Trying compact data for {}...", ticker);
            live.limiter.acquire()?;
            frame = live.provider.get_daily_series(ticker, OutputSize::Compact)?;
        }

        if frame.is_empty() {
            return Err(ForecastError::provider(format!("No data returned for {}", ticker)));
        }

        let mut series = validate(ticker, &frame)?;
        if let Some(cutoff) = period.cutoff(Local::now().date_naive()) {
            let kept = series.count_after(cutoff);
            if kept >= MIN_ROWS {
                series.retain_after(cutoff);
            } else {
                // a trimmed series must still satisfy the row minimum
                tracing::info!(
                    "Only {} rows of {} fall inside {}; keeping all {}",
                    kept,
                    ticker,
                    period,
                    series.len()
                );
            }
        }

        self.cache.save(ticker, period, &series)?;
        Ok(series)
    }

    fn fallback(&self, ticker: &str, state: FetchState, cached: Option<&RawFrame>) -> FetchOutcome {
        let frame = match (state, cached) {
            (FetchState::FetchFailWithFallback, Some(frame)) => frame,
            _ => return FetchOutcome::NoData,
        };

        match validate(ticker, frame) {
            Ok(series) => {
                tracing::info!("Using cached data as fallback for {}", ticker);
                FetchOutcome::Cached(series)
            }
            Err(e) => {
                tracing::warn!("Cached fallback for {} is unusable: {}", ticker, e);
                FetchOutcome::NoData
            }
        }
    }

    /// Company overview; consumes one limiter slot
    pub fn ticker_info(&self, ticker: &str) -> ForecastResult<TickerInfo> {
        let ticker = ticker.to_uppercase();
        let live = self.live.as_ref().ok_or_else(|| {
            ForecastError::configuration(format!("No API key available to fetch info for {}", ticker))
        })?;

        tracing::info!("Fetching company info for {}...", ticker);
        live.limiter.acquire()?;
        let fields = live.provider.get_company_overview(&ticker)?;

        if fields.is_empty() {
            return Err(ForecastError::no_data(format!("No company info available for {}", ticker)));
        }

        Ok(TickerInfo::from_overview(&ticker, &fields))
    }

    /// Clear one entry, every period of a ticker, or the whole cache
    pub fn clear_cache(&self, ticker: Option<&str>, period: Option<Period>) -> ForecastResult<()> {
        match (ticker.map(str::to_uppercase), period) {
            (Some(t), Some(p)) => self.cache.clear(&t, p),
            (Some(t), None) => self.cache.clear_ticker(&t),
            (None, _) => self.cache.clear_all(),
        }
    }

    pub fn cache_info(&self) -> ForecastResult<FetcherInfo> {
        let usage = self.live.as_ref().map(|l| l.limiter.usage());
        Ok(FetcherInfo {
            cache: self.cache.info()?,
            api_calls_today: usage.map(|u| u.daily_calls),
            daily_limit: usage.map(|u| u.daily_limit),
        })
    }
}
