//! Geometric Brownian Motion path simulation
//!
//! Price paths follow the exact GBM step with Δt = 1 trading day:
//!
//! S(t) = S(t-1) · exp((μ - σ²/2)·Δt + σ·√Δt·Z_t),  Z_t ~ N(0, 1)
//!
//! where μ and σ are the daily drift and volatility.
//!
//! Output is an N × (T+1) matrix, one row per path, with column 0 holding
//! the initial price. Randomness is always supplied by the caller (a
//! generator or a seed), never shared between runs.

use std::io;

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use super::estimator::SimulationParameters;
use crate::core::{ForecastError, ForecastResult};

/// Time step in trading days
const DT: f64 = 1.0;

/// Simulated price paths
#[derive(Debug, Clone, PartialEq)]
pub struct PricePathSet {
    /// N paths × (T+1) time points
    paths: Array2<f64>,
}

impl PricePathSet {
    pub fn n_paths(&self) -> usize {
        self.paths.nrows()
    }

    /// Number of simulated steps (T)
    pub fn n_steps(&self) -> usize {
        self.paths.ncols() - 1
    }

    /// (N, T+1)
    pub fn shape(&self) -> (usize, usize) {
        self.paths.dim()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.paths
    }

    pub fn into_array(self) -> Array2<f64> {
        self.paths
    }

    /// One path across all time points
    pub fn path(&self, i: usize) -> ArrayView1<'_, f64> {
        self.paths.row(i)
    }

    /// Day-major view, (T+1) × N: one row per day, one column per path
    pub fn by_day(&self) -> ArrayView2<'_, f64> {
        self.paths.t()
    }

    /// Prices at the last step, one per path
    pub fn final_prices(&self) -> Vec<f64> {
        self.paths.column(self.n_steps()).to_vec()
    }

    /// Write the day-major table as CSV: a `Day` column followed by
    /// `Simulation_1` .. `Simulation_N`.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> ForecastResult<()> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.n_paths() + 1);
        header.push("Day".to_string());
        header.extend((1..=self.n_paths()).map(|i| format!("Simulation_{}", i)));
        writer.write_record(&header)?;

        for (day, prices) in self.by_day().axis_iter(Axis(0)).enumerate() {
            let mut record = Vec::with_capacity(prices.len() + 1);
            record.push(day.to_string());
            record.extend(prices.iter().map(|p| p.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// GBM path generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbmSimulator {
    initial_price: f64,
    daily_drift: f64,
    daily_volatility: f64,
}

impl GbmSimulator {
    pub fn new(initial_price: f64, daily_drift: f64, daily_volatility: f64) -> ForecastResult<Self> {
        if !(initial_price.is_finite() && initial_price > 0.0) {
            return Err(ForecastError::invalid_input("initial price must be positive"));
        }
        if !daily_drift.is_finite() {
            return Err(ForecastError::invalid_input("drift must be finite"));
        }
        if !(daily_volatility.is_finite() && daily_volatility >= 0.0) {
            return Err(ForecastError::invalid_input("volatility must be non-negative"));
        }

        Ok(Self {
            initial_price,
            daily_drift,
            daily_volatility,
        })
    }

    pub fn from_parameters(initial_price: f64, params: &SimulationParameters) -> ForecastResult<Self> {
        Self::new(initial_price, params.daily_drift, params.daily_volatility)
    }

    pub fn initial_price(&self) -> f64 {
        self.initial_price
    }

    /// Simulate `n_paths` paths of `days` steps drawing from one generator,
    /// path by path and step by step.
    pub fn simulate(
        &self,
        days: usize,
        n_paths: usize,
        rng: &mut impl Rng,
    ) -> ForecastResult<PricePathSet> {
        let mut paths = self.allocate(days, n_paths)?;

        for row in paths.axis_iter_mut(Axis(0)) {
            self.fill_path(row, rng);
        }

        Ok(PricePathSet { paths })
    }

    /// `simulate` with a ChaCha8 generator seeded from `seed`
    pub fn simulate_seeded(&self, days: usize, n_paths: usize, seed: u64) -> ForecastResult<PricePathSet> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.simulate(days, n_paths, &mut rng)
    }

    /// Simulate with an independent ChaCha8 stream per path, keyed by the
    /// path index. Output depends only on `seed`, not on execution order, so
    /// rows can be filled concurrently (`parallel` feature).
    pub fn simulate_per_path(&self, days: usize, n_paths: usize, seed: u64) -> ForecastResult<PricePathSet> {
        let mut paths = self.allocate(days, n_paths)?;

        let path_rng = |i: usize| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(i as u64);
            rng
        };

        #[cfg(feature = "parallel")]
        {
            use ndarray::parallel::prelude::*;
            paths
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(i, row)| self.fill_path(row, &mut path_rng(i)));
        }

        #[cfg(not(feature = "parallel"))]
        for (i, row) in paths.axis_iter_mut(Axis(0)).enumerate() {
            self.fill_path(row, &mut path_rng(i));
        }

        Ok(PricePathSet { paths })
    }

    fn allocate(&self, days: usize, n_paths: usize) -> ForecastResult<Array2<f64>> {
        if days == 0 {
            return Err(ForecastError::invalid_input("horizon must be at least one day"));
        }
        if n_paths == 0 {
            return Err(ForecastError::invalid_input("need at least one path"));
        }
        Ok(Array2::zeros((n_paths, days + 1)))
    }

    fn fill_path(&self, mut row: ArrayViewMut1<'_, f64>, rng: &mut impl Rng) {
        let sigma = self.daily_volatility;
        let drift = (self.daily_drift - 0.5 * sigma * sigma) * DT;
        let diffusion = sigma * DT.sqrt();

        row[0] = self.initial_price;
        for t in 1..row.len() {
            let z: f64 = Distribution::<f64>::sample(&StandardNormal, rng);
            row[t] = row[t - 1] * (drift + diffusion * z).exp();
        }
    }
}
