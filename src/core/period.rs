//! History periods
//!
//! A period names how much history a request wants. It keys the cache, picks
//! the provider output size, and bounds the trimming window after a fetch.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::ForecastError;

/// Requested history length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max", alias = "full")]
    Max,
}

impl Period {
    /// Label used in cache keys and on the command line
    pub fn label(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// Two years or more of history
    pub fn is_long_horizon(&self) -> bool {
        matches!(
            self,
            Period::TwoYears | Period::FiveYears | Period::TenYears | Period::Max
        )
    }

    /// Trimming window ending at `today`, or `None` when nothing is trimmed
    pub fn lookback(&self, today: NaiveDate) -> Option<Duration> {
        let days = match self {
            Period::OneDay => 1,
            Period::FiveDays => 5,
            Period::OneMonth => 30,
            Period::ThreeMonths => 90,
            Period::SixMonths => 180,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::FiveYears => 1825,
            Period::TenYears => 3650,
            Period::YearToDate => {
                let jan_first = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
                (today - jan_first).num_days()
            }
            Period::Max => return None,
        };
        Some(Duration::days(days))
    }

    /// Boundary of the trimming window; only dates after it are kept
    pub fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.lookback(today).map(|window| today - window)
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::TwoYears
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let period = match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Period::OneDay,
            "5d" => Period::FiveDays,
            "1mo" => Period::OneMonth,
            "3mo" => Period::ThreeMonths,
            "6mo" => Period::SixMonths,
            "1y" => Period::OneYear,
            "2y" => Period::TwoYears,
            "5y" => Period::FiveYears,
            "10y" => Period::TenYears,
            "ytd" => Period::YearToDate,
            "max" | "full" => Period::Max,
            other => {
                return Err(ForecastError::invalid_input(format!(
                    "Unknown period '{}'",
                    other
                )))
            }
        };
        Ok(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_label() {
        for label in ["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"] {
            let period: Period = label.parse().unwrap();
            assert_eq!(period.label(), label);
        }
        assert_eq!("full".parse::<Period>().unwrap(), Period::Max);
        assert!("7w".parse::<Period>().is_err());
    }

    #[test]
    fn test_long_horizon() {
        assert!(Period::TwoYears.is_long_horizon());
        assert!(Period::Max.is_long_horizon());
        assert!(!Period::OneYear.is_long_horizon());
        assert!(!Period::YearToDate.is_long_horizon());
    }

    #[test]
    fn test_cutoff() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert_eq!(
            Period::OneMonth.cutoff(today),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(
            Period::YearToDate.cutoff(today),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(Period::Max.cutoff(today), None);
    }
}
