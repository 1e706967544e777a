//! Run configuration
//!
//! Loaded from a YAML file. Every field has a default so a partial (or
//! missing) file still produces a usable configuration.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ForecastError, ForecastResult};
use super::period::Period;

/// Environment variable consulted when no key is configured
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tickers: Vec<String>,
    pub data: DataConfig,
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Load from a YAML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> ForecastResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("Config file not found: {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> ForecastResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Data acquisition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Provider key; placeholders such as `null` count as unset
    pub alpha_vantage_api_key: Option<String>,
    /// Days a cache entry stays fresh
    pub cache_duration_days: i64,
    pub api_rate_limit_per_minute: u32,
    pub api_daily_limit: u32,
    /// History requested per ticker
    pub period: Period,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            cache_duration_days: 1,
            api_rate_limit_per_minute: 5,
            api_daily_limit: 25,
            period: Period::TwoYears,
        }
    }
}

impl DataConfig {
    /// Resolve the provider credential: explicit configuration first, then
    /// the environment.
    pub fn api_key(&self) -> Option<String> {
        self.configured_key()
            .or_else(|| env::var(API_KEY_ENV).ok().and_then(|k| normalize_key(&k)))
    }

    fn configured_key(&self) -> Option<String> {
        self.alpha_vantage_api_key.as_deref().and_then(normalize_key)
    }
}

fn normalize_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    match key {
        "" | "null" | "None" => None,
        _ => Some(key.to_string()),
    }
}

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Trading days to simulate
    pub days: usize,
    /// Number of paths
    pub simulations: usize,
    pub confidence_levels: Vec<f64>,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 252,
            simulations: 10_000,
            confidence_levels: vec![0.05, 0.95],
            seed: 42,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> ForecastResult<()> {
        if self.days == 0 {
            return Err(ForecastError::invalid_input("days must be at least 1"));
        }
        if self.simulations == 0 {
            return Err(ForecastError::invalid_input("simulations must be at least 1"));
        }
        if let Some(c) = self
            .confidence_levels
            .iter()
            .find(|c| !(0.0..=1.0).contains(*c))
        {
            return Err(ForecastError::invalid_input(format!(
                "confidence level {} is outside [0, 1]",
                c
            )));
        }
        Ok(())
    }
}
