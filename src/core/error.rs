//! Error types for mc-forecast

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Daily API limit of {limit} calls exceeded")]
    QuotaExceeded { limit: u32 },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Insufficient data: only {rows} valid rows (need at least {required})")]
    InsufficientData { rows: usize, required: usize },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Cache corruption: {0}")]
    CacheCorruption(String),

    #[error("No data available: {0}")]
    NoDataAvailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ForecastResult<T> = Result<T, ForecastError>;

impl ForecastError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoDataAvailable(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(e: csv::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for ForecastError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ForecastError::InsufficientData { rows: 29, required: 30 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: only 29 valid rows (need at least 30)"
        );

        let err = ForecastError::QuotaExceeded { limit: 25 };
        assert_eq!(err.to_string(), "Daily API limit of 25 calls exceeded");
    }
}
