//! Risk metrics over simulated final prices
//!
//! Percentiles use linear interpolation between closest ranks, with the
//! rank of percentile p on n sorted values at p/100 · (n-1).
//!
//! VaR at confidence c is reported as a price level, the (1-c)·100-th
//! percentile of the final price distribution.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::core::{ForecastError, ForecastResult};

/// Summary of the final price distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskStatistics {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
    pub skewness: f64,
    /// Excess kurtosis (normal = 0)
    pub kurtosis: f64,
}

/// Value at Risk at one confidence level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarEstimate {
    pub confidence: f64,
    pub price: f64,
}

/// Statistics plus VaR for each requested confidence level, in request order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub statistics: RiskStatistics,
    pub var: Vec<VarEstimate>,
}

impl RiskReport {
    pub fn analyze(final_prices: &[f64], confidence_levels: &[f64]) -> ForecastResult<Self> {
        Ok(Self {
            statistics: calculate_statistics(final_prices)?,
            var: calculate_var(final_prices, confidence_levels)?,
        })
    }

    pub fn var_at(&self, confidence: f64) -> Option<f64> {
        self.var
            .iter()
            .find(|v| (v.confidence - confidence).abs() < 1e-12)
            .map(|v| v.price)
    }
}

/// Summary statistics of a non-empty sample
pub fn calculate_statistics(values: &[f64]) -> ForecastResult<RiskStatistics> {
    let sorted = sorted_sample(values)?;

    let mean = values.iter().mean();
    let std = values.iter().population_std_dev();
    let (skewness, kurtosis) = standardized_moments(values, mean, std);

    Ok(RiskStatistics {
        mean,
        median: percentile(&sorted, 50.0),
        std,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        q25: percentile(&sorted, 25.0),
        q75: percentile(&sorted, 75.0),
        skewness,
        kurtosis,
    })
}

/// VaR price level for each confidence in `confidence_levels`
pub fn calculate_var(values: &[f64], confidence_levels: &[f64]) -> ForecastResult<Vec<VarEstimate>> {
    let sorted = sorted_sample(values)?;

    confidence_levels
        .iter()
        .map(|&confidence| {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ForecastError::invalid_input(format!(
                    "confidence level {} outside [0, 1]",
                    confidence
                )));
            }
            Ok(VarEstimate {
                confidence,
                price: percentile(&sorted, (1.0 - confidence) * 100.0),
            })
        })
        .collect()
}

/// Percentile `p` (0..=100) of an ascending slice; NaN when empty
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    match n {
        0 => return f64::NAN,
        1 => return sorted[0],
        _ => {}
    }

    let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn sorted_sample(values: &[f64]) -> ForecastResult<Vec<f64>> {
    if values.is_empty() {
        return Err(ForecastError::invalid_input("empty sample"));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::invalid_input("sample contains non-finite values"));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

/// Population skewness and excess kurtosis. A degenerate sample (zero
/// spread) has no defined shape and reports 0 for both.
fn standardized_moments(values: &[f64], mean: f64, std: f64) -> (f64, f64) {
    if std == 0.0 {
        return (0.0, 0.0);
    }

    let n = values.len() as f64;
    let (m3, m4) = values.iter().fold((0.0, 0.0), |(m3, m4), &v| {
        let z = (v - mean) / std;
        (m3 + z.powi(3), m4 + z.powi(4))
    });

    (m3 / n, m4 / n - 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [f64; 5] = [90.0, 95.0, 100.0, 105.0, 110.0];

    #[test]
    fn test_statistics_symmetric_sample() {
        let stats = calculate_statistics(&SAMPLE).unwrap();

        assert!((stats.mean - 100.0).abs() < 1e-12);
        assert!((stats.median - 100.0).abs() < 1e-12);
        assert!((stats.q25 - 95.0).abs() < 1e-12);
        assert!((stats.q75 - 105.0).abs() < 1e-12);
        assert_eq!(stats.min, 90.0);
        assert_eq!(stats.max, 110.0);
        assert!((stats.std - 50f64.sqrt()).abs() < 1e-12);
        assert!(stats.skewness.abs() < 1e-12);
        assert!((stats.kurtosis + 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&sorted, 10.0) - 1.3).abs() < 1e-12);
        assert_eq!(percentile(&[7.0], 33.0), 7.0);
        assert!(percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_var_levels() {
        let var = calculate_var(&SAMPLE, &[0.05, 0.95]).unwrap();

        assert_eq!(var.len(), 2);
        assert_eq!(var[0].confidence, 0.05);
        assert!((var[0].price - 109.0).abs() < 1e-9);
        assert!((var[1].price - 91.0).abs() < 1e-9);
        assert!(var[0].price >= var[1].price);
    }

    #[test]
    fn test_var_order_is_preserved() {
        let report = RiskReport::analyze(&SAMPLE, &[0.99, 0.5, 0.01]).unwrap();
        let levels: Vec<f64> = report.var.iter().map(|v| v.confidence).collect();

        assert_eq!(levels, vec![0.99, 0.5, 0.01]);
        assert_eq!(report.var_at(0.5), Some(100.0));
        assert_eq!(report.var_at(0.25), None);
    }

    #[test]
    fn test_degenerate_sample() {
        let stats = calculate_statistics(&[100.0; 10]).unwrap();
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
        assert_eq!(stats.median, 100.0);
    }

    #[test]
    fn test_invalid_samples() {
        assert!(calculate_statistics(&[]).is_err());
        assert!(calculate_var(&[1.0, f64::NAN], &[0.05]).is_err());
        assert!(calculate_var(&SAMPLE, &[1.5]).is_err());
    }
}
