//! Forecasting models
//!
//! Implements:
//! - Drift/volatility estimation from daily returns
//! - Geometric Brownian Motion path simulation
//! - Risk statistics and Value at Risk over final prices
//! - The per-ticker Monte Carlo run tying them together

pub mod estimator;
pub mod gbm;
pub mod risk;
pub mod simulation;

pub use estimator::*;
pub use gbm::*;
pub use risk::*;
pub use simulation::*;
