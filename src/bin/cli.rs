//! Monte Carlo forecast batch runner
//!
//! Fetches history for each ticker, simulates GBM price paths and writes
//! per-ticker results into the output directory.
//!
//! Usage:
//! ```bash
//! mc-forecast --tickers AAPL MSFT --days 252 --simulations 10000
//! ```

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mc_forecast::prelude::*;

#[derive(Parser)]
#[command(name = "mc-forecast")]
#[command(version, about = "Monte Carlo Stock Price Simulation", long_about = None)]
struct Cli {
    /// Stock ticker symbols (e.g., AAPL MSFT GOOGL)
    #[arg(short, long, num_args = 1..)]
    tickers: Vec<String>,

    /// Number of days to simulate
    #[arg(short, long)]
    days: Option<usize>,

    /// Number of Monte Carlo simulations
    #[arg(short, long)]
    simulations: Option<usize>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config/simulation.yaml")]
    config: PathBuf,

    /// Output directory for results
    #[arg(short, long, default_value = "results")]
    output_dir: PathBuf,

    /// Directory for data cache
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,

    /// Confidence levels for VaR calculation
    #[arg(long, num_args = 1..)]
    confidence_levels: Vec<f64>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// History to fetch (1mo, 6mo, 1y, 2y, 5y, max, ...)
    #[arg(long)]
    period: Option<Period>,

    /// Ignore fresh cache entries and download again
    #[arg(long)]
    force_refresh: bool,

    /// Delete all cached data and exit
    #[arg(long)]
    clear_cache: bool,

    /// Print cache statistics and exit
    #[arg(long)]
    cache_info: bool,
}

impl Cli {
    /// Command-line values take precedence over the config file
    fn apply(&self, config: &mut AppConfig) {
        if !self.tickers.is_empty() {
            config.tickers = self.tickers.clone();
        }
        if let Some(days) = self.days {
            config.simulation.days = days;
        }
        if let Some(simulations) = self.simulations {
            config.simulation.simulations = simulations;
        }
        if !self.confidence_levels.is_empty() {
            config.simulation.confidence_levels = self.confidence_levels.clone();
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(period) = self.period {
            config.data.period = period;
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error during simulation: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> ForecastResult<()> {
    let mut config = AppConfig::load(&cli.config)?;
    cli.apply(&mut config);

    let fetcher = DataFetcher::new(&cli.cache_dir, &config.data)?;

    if cli.clear_cache {
        fetcher.clear_cache(None, None)?;
        println!("Cache cleared: {}", cli.cache_dir.display());
        return Ok(());
    }

    if cli.cache_info {
        let info = fetcher.cache_info()?;
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    if config.tickers.is_empty() {
        return Err(ForecastError::configuration(
            "no ticker symbols provided; use --tickers or specify them in the config file",
        ));
    }
    config.simulation.validate()?;

    fs::create_dir_all(&cli.output_dir)?;

    let sim = &config.simulation;
    println!("Starting Monte Carlo simulation for: {}", config.tickers.join(", "));
    println!("Simulations: {}, Days: {}", sim.simulations, sim.days);

    let simulator = MonteCarloSimulator::new(sim.seed);
    let mut completed = 0usize;

    for ticker in &config.tickers {
        println!("\nProcessing {}...", ticker);

        let series = match fetcher.fetch_ticker_data(ticker, config.data.period, cli.force_refresh) {
            Ok(outcome) => match outcome.into_series() {
                Some(series) => series,
                None => {
                    tracing::warn!("No data found for {}, skipping...", ticker);
                    continue;
                }
            },
            Err(e) => {
                tracing::error!("Skipping {}: {}", ticker, e);
                continue;
            }
        };

        let result = match simulator.run(&series, sim.days, sim.simulations, &sim.confidence_levels) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Simulation failed for {}: {}", ticker, e);
                continue;
            }
        };

        if let Err(e) = write_results(&cli.output_dir, &result) {
            tracing::error!("Could not save results for {}: {}", ticker, e);
            continue;
        }

        print_summary(&result);
        completed += 1;
    }

    println!("\nSimulation completed: {}/{} tickers", completed, config.tickers.len());
    println!("Local results available in: {}", cli.output_dir.display());

    Ok(())
}

fn write_results(output_dir: &Path, result: &SimulationResult) -> ForecastResult<()> {
    let csv_path = output_dir.join(format!("{}_simulation.csv", result.ticker));
    result.paths.write_csv(BufWriter::new(File::create(&csv_path)?))?;
    println!("Results saved to: {}", csv_path.display());

    let summary_path = output_dir.join(format!("{}_summary.json", result.ticker));
    serde_json::to_writer_pretty(BufWriter::new(File::create(&summary_path)?), &result.summary())?;
    println!("Summary saved to: {}", summary_path.display());

    Ok(())
}

fn print_summary(result: &SimulationResult) {
    let stats = &result.statistics;
    println!("Final Price Statistics:");
    println!("  Mean: ${:.2}", stats.mean);
    println!("  Median: ${:.2}", stats.median);
    println!("  Std Dev: ${:.2}", stats.std);

    for v in &result.var {
        println!("  VaR ({:.0}%): ${:.2}", v.confidence * 100.0, v.price);
    }
}
