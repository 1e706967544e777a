//! Full pipeline: provider → cache → simulation → output files

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, Local};
use mc_forecast::core::PROVIDER_COLUMNS;
use mc_forecast::prelude::*;
use tempfile::tempdir;

/// Serves one fixed history and counts daily-series requests
struct FixtureProvider {
    frame: RawFrame,
    calls: AtomicUsize,
}

impl FixtureProvider {
    fn new(frame: RawFrame) -> Arc<Self> {
        Arc::new(Self {
            frame,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MarketDataProvider for FixtureProvider {
    fn get_daily_series(&self, _symbol: &str, _size: OutputSize) -> ForecastResult<RawFrame> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.clone())
    }

    fn get_company_overview(&self, symbol: &str) -> ForecastResult<HashMap<String, String>> {
        Err(ForecastError::provider(format!("no overview for {}", symbol)))
    }
}

/// Synthetic 100-day history in the provider's column naming
fn provider_frame(days: i64) -> RawFrame {
    let today = Local::now().date_naive();
    let mut frame = RawFrame::new(PROVIDER_COLUMNS.iter().map(|c| c.to_string()).collect());

    for i in 0..days {
        let close = 150.0 * (1.0 + 0.015 * ((i as f64) * 0.45).sin()) * (1.0 + 0.0008 * i as f64);
        frame.push(
            today - Duration::days(days - 1 - i),
            vec![Some(close * 0.99), Some(close * 1.01), Some(close * 0.98), Some(close), Some(2.5e6)],
        );
    }
    frame
}

fn fetcher(dir: &std::path::Path, provider: &Arc<FixtureProvider>) -> DataFetcher {
    let cache = DataCache::new(CacheConfig {
        cache_dir: dir.to_path_buf(),
        cache_duration_days: 1,
    })
    .unwrap();
    DataFetcher::with_provider(cache, provider.clone(), RateLimiter::new(5, 25))
}

#[test]
fn test_synthetic_history_to_report() {
    let dir = tempdir().unwrap();
    let provider = FixtureProvider::new(provider_frame(100));
    let fetcher = fetcher(dir.path(), &provider);

    let outcome = fetcher.fetch_ticker_data("aapl", Period::Max, false).unwrap();
    let series = outcome.into_series().unwrap();
    assert_eq!(series.ticker, "AAPL");
    assert_eq!(series.len(), 100);

    let result = MonteCarloSimulator::new(42)
        .run(&series, 10, 100, &[0.05, 0.95])
        .unwrap();

    assert_eq!(result.paths.by_day().dim(), (11, 100));
    assert_eq!(result.final_prices.len(), 100);

    let levels: Vec<f64> = result.var.iter().map(|v| v.confidence).collect();
    assert_eq!(levels, vec![0.05, 0.95]);
    assert!(result.var_at(0.05).unwrap() >= result.var_at(0.95).unwrap());

    assert!(result
        .paths
        .by_day()
        .row(0)
        .iter()
        .all(|&p| p == series.last_close().unwrap()));
}

#[test]
fn test_second_run_is_served_from_cache() {
    let dir = tempdir().unwrap();
    let provider = FixtureProvider::new(provider_frame(100));

    let first = fetcher(dir.path(), &provider)
        .fetch_ticker_data("MSFT", Period::Max, false)
        .unwrap();
    let second = fetcher(dir.path(), &provider)
        .fetch_ticker_data("MSFT", Period::Max, false)
        .unwrap();

    assert!(!first.is_from_cache());
    assert!(second.is_from_cache());
    assert_eq!(provider.calls(), 1);

    let sim = MonteCarloSimulator::new(9);
    let a = sim.run(first.series().unwrap(), 5, 25, &[0.05]).unwrap();
    let b = sim.run(second.series().unwrap(), 5, 25, &[0.05]).unwrap();

    // Cached history reproduces the same forecast
    assert_eq!(a.paths, b.paths);
}

#[test]
fn test_outputs_written() {
    let dir = tempdir().unwrap();
    let provider = FixtureProvider::new(provider_frame(60));

    let series = fetcher(dir.path(), &provider)
        .fetch_ticker_data("IBM", Period::Max, false)
        .unwrap()
        .into_series()
        .unwrap();
    let result = MonteCarloSimulator::new(1).run(&series, 4, 3, &[0.05, 0.95]).unwrap();

    let csv_path = dir.path().join("IBM_simulation.csv");
    result.paths.write_csv(fs::File::create(&csv_path).unwrap()).unwrap();
    let text = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Day,Simulation_1,Simulation_2,Simulation_3");
    assert_eq!(lines.len(), 6);

    let json = serde_json::to_string(&result.summary()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["ticker"], "IBM");
    assert_eq!(value["simulations"], 3);
}
