//! Core data types for mc-forecast
//!
//! Defines fundamental types:
//! - TimeSeries / OhlcvBar: validated daily price history
//! - RawFrame: untyped tables as received from a provider or read from disk
//! - Period: requested history length
//! - AppConfig: run configuration

pub mod config;
pub mod error;
pub mod period;
pub mod series;

pub use config::*;
pub use error::*;
pub use period::*;
pub use series::*;
