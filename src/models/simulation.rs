//! End-to-end Monte Carlo run for one ticker
//!
//! history → parameters → GBM paths from the last close → risk report

use serde::Serialize;

use super::estimator::SimulationParameters;
use super::gbm::{GbmSimulator, PricePathSet};
use super::risk::{RiskReport, RiskStatistics, VarEstimate};
use crate::core::{ForecastError, ForecastResult, TimeSeries, MIN_ROWS};

/// Runs simulations with a fixed seed, so repeated runs on the same input
/// produce identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloSimulator {
    seed: u64,
}

impl MonteCarloSimulator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run(
        &self,
        series: &TimeSeries,
        days: usize,
        simulations: usize,
        confidence_levels: &[f64],
    ) -> ForecastResult<SimulationResult> {
        if series.len() < MIN_ROWS {
            return Err(ForecastError::InsufficientData {
                rows: series.len(),
                required: MIN_ROWS,
            });
        }

        let closes = series.closes();
        let parameters = SimulationParameters::from_prices(&closes)?;
        let initial_price = series
            .last_close()
            .ok_or_else(|| ForecastError::no_data(series.ticker.clone()))?;

        tracing::info!(
            "{}: annual drift {:.4}, annual volatility {:.4}, initial price ${:.2}",
            series.ticker,
            parameters.annual_drift,
            parameters.annual_volatility,
            initial_price
        );
        tracing::info!("Running {} simulations for {} days...", simulations, days);

        let gbm = GbmSimulator::from_parameters(initial_price, &parameters)?;
        let paths = gbm.simulate_seeded(days, simulations, self.seed)?;

        let final_prices = paths.final_prices();
        let RiskReport { statistics, var } = RiskReport::analyze(&final_prices, confidence_levels)?;

        tracing::debug!("{}: mean final price {:.2}", series.ticker, statistics.mean);

        Ok(SimulationResult {
            ticker: series.ticker.clone(),
            paths,
            final_prices,
            statistics,
            var,
            parameters,
            initial_price,
            simulations,
            days,
        })
    }
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub ticker: String,
    pub paths: PricePathSet,
    pub final_prices: Vec<f64>,
    pub statistics: RiskStatistics,
    pub var: Vec<VarEstimate>,
    pub parameters: SimulationParameters,
    pub initial_price: f64,
    pub simulations: usize,
    pub days: usize,
}

impl SimulationResult {
    pub fn var_at(&self, confidence: f64) -> Option<f64> {
        self.var
            .iter()
            .find(|v| (v.confidence - confidence).abs() < 1e-12)
            .map(|v| v.price)
    }

    /// Serializable view without the path matrix
    pub fn summary(&self) -> SimulationSummary<'_> {
        SimulationSummary {
            ticker: &self.ticker,
            initial_price: self.initial_price,
            simulations: self.simulations,
            days: self.days,
            parameters: &self.parameters,
            statistics: &self.statistics,
            var: &self.var,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimulationSummary<'a> {
    pub ticker: &'a str,
    pub initial_price: f64,
    pub simulations: usize,
    pub days: usize,
    pub parameters: &'a SimulationParameters,
    pub statistics: &'a RiskStatistics,
    pub var: &'a [VarEstimate],
}
