//! Daily price series
//!
//! Two shapes of tabular data flow through the crate:
//! - `RawFrame`: loosely typed rows keyed by whatever column names the source
//!   used (provider payloads, cache files read back from disk)
//! - `TimeSeries`: the validated, canonical OHLCV form consumed by the models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical column names, in file order
pub const CANONICAL_COLUMNS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

/// Raw provider column names, positionally matching `CANONICAL_COLUMNS`
pub const PROVIDER_COLUMNS: [&str; 5] = ["1. open", "2. high", "3. low", "4. close", "5. volume"];

/// Minimum number of valid rows a series must keep after cleaning
pub const MIN_ROWS: usize = 30;

/// One daily OHLCV record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl OhlcvBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close,
            volume: Some(volume),
        }
    }
}

/// Validated daily series for one ticker.
///
/// Bars are strictly ascending by date, dates are unique and every bar has a
/// Close. Construct through `data::validate` to get those guarantees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub ticker: String,
    pub bars: Vec<OhlcvBar>,
}

impl TimeSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Most recent Close
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Keep only bars dated strictly after `cutoff`
    pub fn retain_after(&mut self, cutoff: NaiveDate) {
        self.bars.retain(|b| b.date > cutoff);
    }

    /// Number of bars dated strictly after `cutoff`
    pub fn count_after(&self, cutoff: NaiveDate) -> usize {
        self.bars.iter().filter(|b| b.date > cutoff).count()
    }

    /// Canonical column set carried by this series
    pub fn columns(&self) -> Vec<String> {
        CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect()
    }
}

/// Untyped row as received from a source
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub date: NaiveDate,
    /// One value per entry of `RawFrame::columns`; `None` for missing cells
    pub values: Vec<Option<f64>>,
}

/// Untyped table: named columns plus dated rows, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, date: NaiveDate, values: Vec<Option<f64>>) {
        self.rows.push(RawRow { date, values });
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

impl From<&TimeSeries> for RawFrame {
    fn from(series: &TimeSeries) -> Self {
        let mut frame = RawFrame::new(series.columns());
        for bar in &series.bars {
            frame.push(
                bar.date,
                vec![bar.open, bar.high, bar.low, Some(bar.close), bar.volume],
            );
        }
        frame
    }
}
