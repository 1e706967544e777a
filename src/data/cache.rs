//! Local data caching
//!
//! Caches validated price series locally to stay inside the provider's call
//! quotas and to keep working offline. Each (ticker, period) key owns two
//! files in the cache directory:
//! - `<TICKER>_<period>_data.csv`: dated OHLCV rows
//! - `<TICKER>_<period>_meta.json`: freshness metadata
//!
//! Reads never fail loudly: a missing, unreadable or malformed entry is a
//! cache miss.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::core::{
    ForecastError, ForecastResult, OhlcvBar, Period, RawFrame, TimeSeries, CANONICAL_COLUMNS,
    MIN_ROWS, PROVIDER_COLUMNS,
};

/// Source tag written into metadata
pub const DATA_SOURCE: &str = "alpha_vantage";

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Cache directory
    pub cache_dir: PathBuf,
    /// Days before an entry goes stale
    pub cache_duration_days: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data"),
            cache_duration_days: 1,
        }
    }
}

/// Metadata stored next to each cached series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub ticker: String,
    pub period: String,
    /// Local wall-clock time of the write
    pub cached_at: NaiveDateTime,
    pub rows: usize,
    pub columns: Vec<String>,
    #[serde(rename = "data_source")]
    pub source: String,
}

/// Summary of the cache directory
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub cache_dir: PathBuf,
    pub total_files: usize,
    pub total_size_mb: f64,
    pub cached_tickers: Vec<String>,
    pub cache_duration_days: i64,
}

/// Data cache manager
#[derive(Debug, Clone)]
pub struct DataCache {
    config: CacheConfig,
}

impl DataCache {
    pub fn new(config: CacheConfig) -> ForecastResult<Self> {
        // Create cache directory if needed
        if !config.cache_dir.exists() {
            fs::create_dir_all(&config.cache_dir)?;
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn data_path(&self, ticker: &str, period: Period) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("{}_{}_data.csv", ticker, period.label()))
    }

    fn meta_path(&self, ticker: &str, period: Period) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("{}_{}_meta.json", ticker, period.label()))
    }

    /// Read metadata; `None` when missing or unparseable
    pub fn meta(&self, ticker: &str, period: Period) -> Option<CacheMeta> {
        let raw = fs::read_to_string(self.meta_path(ticker, period)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::debug!("Ignoring unreadable cache metadata for {}: {}", ticker, e);
                None
            }
        }
    }

    /// Check if cache is valid (metadata present, parseable and not expired)
    pub fn is_valid(&self, ticker: &str, period: Period) -> bool {
        self.is_valid_at(ticker, period, Local::now())
    }

    pub fn is_valid_at(&self, ticker: &str, period: Period, now: DateTime<Local>) -> bool {
        match self.meta(ticker, period) {
            Some(meta) => {
                let expiry = meta.cached_at + Duration::days(self.config.cache_duration_days);
                now.naive_local() < expiry
            }
            None => false,
        }
    }

    /// Save a validated series plus metadata
    pub fn save(&self, ticker: &str, period: Period, series: &TimeSeries) -> ForecastResult<()> {
        let data_path = self.data_path(ticker, period);
        write_csv(&data_path, series)?;

        let meta = CacheMeta {
            ticker: ticker.to_string(),
            period: period.label().to_string(),
            cached_at: Local::now().naive_local(),
            rows: series.len(),
            columns: series.columns(),
            source: DATA_SOURCE.to_string(),
        };
        fs::write(self.meta_path(ticker, period), serde_json::to_string_pretty(&meta)?)?;

        tracing::info!("Cached {} rows for {} at {:?}", series.len(), ticker, data_path);
        Ok(())
    }

    /// Load the raw cached table, regardless of freshness. Any read or parse
    /// failure is a miss.
    pub fn load(&self, ticker: &str, period: Period) -> Option<RawFrame> {
        let path = self.data_path(ticker, period);
        if !path.exists() {
            return None;
        }

        match read_csv(&path) {
            Ok(frame) => {
                tracing::info!("Loaded {} rows from cache for {}", frame.len(), ticker);
                Some(frame)
            }
            Err(e) => {
                let err = ForecastError::CacheCorruption(format!("{:?}: {}", path, e));
                tracing::warn!("Error loading cache for {}: {}", ticker, err);
                None
            }
        }
    }

    /// Clear cache for one ticker and period
    pub fn clear(&self, ticker: &str, period: Period) -> ForecastResult<()> {
        for path in [self.data_path(ticker, period), self.meta_path(ticker, period)] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        tracing::info!("Cleared cache for {} ({})", ticker, period);
        Ok(())
    }

    /// Clear every period cached for a ticker
    pub fn clear_ticker(&self, ticker: &str) -> ForecastResult<()> {
        let prefix = format!("{}_", ticker);

        for entry in fs::read_dir(&self.config.cache_dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();

            if file_name.starts_with(&prefix) && entry.path().is_file() {
                fs::remove_file(entry.path())?;
            }
        }

        tracing::info!("Cleared all cache for {}", ticker);
        Ok(())
    }

    /// Clear all cache
    pub fn clear_all(&self) -> ForecastResult<()> {
        for entry in fs::read_dir(&self.config.cache_dir)? {
            let entry = entry?;
            if entry.path().is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        tracing::info!("Cleared all cache");
        Ok(())
    }

    /// Describe what is cached
    pub fn info(&self) -> ForecastResult<CacheInfo> {
        let mut total_files = 0;
        let mut total_bytes = 0u64;
        let mut tickers = BTreeSet::new();

        for entry in fs::read_dir(&self.config.cache_dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();

            if !file_name.ends_with("_data.csv") {
                continue;
            }
            total_files += 1;
            total_bytes += entry.metadata()?.len();
            if let Some((ticker, _)) = file_name.split_once('_') {
                tickers.insert(ticker.to_string());
            }
        }

        let total_size_mb = total_bytes as f64 / (1024.0 * 1024.0);
        Ok(CacheInfo {
            cache_dir: self.config.cache_dir.clone(),
            total_files,
            total_size_mb: (total_size_mb * 100.0).round() / 100.0,
            cached_tickers: tickers.into_iter().collect(),
            cache_duration_days: self.config.cache_duration_days,
        })
    }
}

/// Column-naming schemes accepted by `validate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schema {
    Provider,
    Canonical,
}

impl Schema {
    fn detect(frame: &RawFrame) -> Option<Self> {
        if frame.has_column(PROVIDER_COLUMNS[0]) {
            Some(Schema::Provider)
        } else if frame.has_column(CANONICAL_COLUMNS[0]) {
            Some(Schema::Canonical)
        } else {
            None
        }
    }

    fn required(&self) -> &'static [&'static str; 5] {
        match self {
            Schema::Provider => &PROVIDER_COLUMNS,
            Schema::Canonical => &CANONICAL_COLUMNS,
        }
    }
}

/// Normalize and clean a raw table into a `TimeSeries`.
///
/// Accepts either the provider's column names (`1. open` ... `5. volume`) or
/// the canonical `Open` ... `Volume`. Rows without a Close are dropped, the
/// result is sorted ascending by date with duplicate dates collapsed to the
/// last occurrence, and must keep at least `MIN_ROWS` rows.
pub fn validate(ticker: &str, frame: &RawFrame) -> ForecastResult<TimeSeries> {
    if frame.is_empty() {
        return Err(ForecastError::no_data(format!("No data available for ticker {}", ticker)));
    }

    let schema = Schema::detect(frame).ok_or_else(|| {
        ForecastError::schema(format!(
            "Unrecognized data format for {}. Expected either provider or canonical columns, got {:?}",
            ticker, frame.columns
        ))
    })?;

    let required = schema.required();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|c| !frame.has_column(c))
        .collect();
    if !missing.is_empty() {
        return Err(ForecastError::schema(format!(
            "Missing columns for {}: {:?}",
            ticker, missing
        )));
    }

    // Positions of Open, High, Low, Close, Volume in the frame
    let idx: Vec<usize> = required
        .iter()
        .filter_map(|c| frame.column_index(c))
        .collect();
    let cell = |values: &[Option<f64>], i: usize| values.get(idx[i]).copied().flatten();

    let mut bars: Vec<OhlcvBar> = frame
        .rows
        .iter()
        .filter_map(|row| {
            let close = cell(row.values.as_slice(), 3).filter(|c| c.is_finite())?;
            Some(OhlcvBar {
                date: row.date,
                open: cell(row.values.as_slice(), 0),
                high: cell(row.values.as_slice(), 1),
                low: cell(row.values.as_slice(), 2),
                close,
                volume: cell(row.values.as_slice(), 4),
            })
        })
        .collect();

    let dropped = frame.len() - bars.len();
    if dropped > 0 {
        tracing::info!("Removed {} rows with missing Close prices", dropped);
    }

    // Stable: among equal dates the last source row wins
    bars.sort_by_key(|b| b.date);
    let mut deduped: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => deduped.push(bar),
        }
    }

    if deduped.len() < MIN_ROWS {
        return Err(ForecastError::InsufficientData {
            rows: deduped.len(),
            required: MIN_ROWS,
        });
    }

    Ok(TimeSeries::new(ticker, deduped))
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
}

fn write_csv(path: &Path, series: &TimeSeries) -> ForecastResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for bar in &series.bars {
        writer.serialize(CsvRow {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: Some(bar.close),
            volume: bar.volume,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a cached table back as a generic frame keyed by the file's header.
/// The first column holds the date; every other column is numeric.
fn read_csv(path: &Path) -> ForecastResult<RawFrame> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let columns: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();
    let mut frame = RawFrame::new(columns);

    for record in reader.records() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| ForecastError::Serialization(format!("bad date '{}': {}", raw_date, e)))?;

        let values = record
            .iter()
            .skip(1)
            .map(|v| {
                let v = v.trim();
                if v.is_empty() {
                    Ok(None)
                } else {
                    v.parse::<f64>().map(Some).map_err(|e| {
                        ForecastError::Serialization(format!("bad value '{}': {}", v, e))
                    })
                }
            })
            .collect::<ForecastResult<Vec<_>>>()?;
        frame.push(date, values);
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    fn canonical_frame(rows: usize) -> RawFrame {
        let mut frame = RawFrame::new(CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect());
        for i in 0..rows {
            let close = 100.0 + i as f64;
            frame.push(
                day(i as i64),
                vec![Some(close - 0.5), Some(close + 1.0), Some(close - 1.0), Some(close), Some(1e6)],
            );
        }
        frame
    }

    fn provider_frame(rows: usize) -> RawFrame {
        let mut frame = canonical_frame(rows);
        frame.columns = PROVIDER_COLUMNS.iter().map(|c| c.to_string()).collect();
        // Providers deliver newest first
        frame.rows.reverse();
        frame
    }

    fn cache_in(dir: &Path) -> DataCache {
        DataCache::new(CacheConfig {
            cache_dir: dir.to_path_buf(),
            cache_duration_days: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_validate_renames_provider_columns() {
        let from_provider = validate("TEST", &provider_frame(40)).unwrap();
        let from_canonical = validate("TEST", &canonical_frame(40)).unwrap();

        assert_eq!(from_provider, from_canonical);
        assert_eq!(from_provider.first_date(), Some(day(0)));
        assert_eq!(from_provider.last_close(), Some(139.0));
    }

    #[test]
    fn test_validate_unknown_schema() {
        let mut frame = canonical_frame(40);
        frame.columns = vec!["o".into(), "h".into(), "l".into(), "c".into(), "v".into()];

        let err = validate("TEST", &frame).unwrap_err();
        assert!(matches!(err, ForecastError::Schema(_)));
    }

    #[test]
    fn test_validate_incomplete_schema() {
        let mut frame = canonical_frame(40);
        frame.columns[4] = "Turnover".into();

        let err = validate("TEST", &frame).unwrap_err();
        assert!(matches!(err, ForecastError::Schema(_)));
    }

    #[test]
    fn test_validate_row_threshold() {
        let err = validate("TEST", &canonical_frame(29)).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { rows: 29, required: 30 }));

        assert_eq!(validate("TEST", &canonical_frame(30)).unwrap().len(), 30);
    }

    #[test]
    fn test_validate_drops_missing_close() {
        let mut frame = canonical_frame(32);
        frame.rows[5].values[3] = None;
        frame.rows[6].values[3] = None;
        frame.rows[7].values[3] = None;

        let err = validate("TEST", &frame).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { rows: 29, .. }));
    }

    #[test]
    fn test_validate_sorts_and_dedups() {
        let mut frame = canonical_frame(31);
        frame.rows.swap(0, 10);
        let mut dup = frame.rows[3].clone();
        dup.values[3] = Some(999.0);
        frame.rows.push(dup);

        let series = validate("TEST", &frame).unwrap();
        assert_eq!(series.len(), 31);
        assert!(series.bars.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(series.bars[3].close, 999.0);
    }

    #[test]
    fn test_cache_operations() {
        let temp_dir = tempdir().unwrap();
        let cache = cache_in(temp_dir.path());
        let series = validate("TEST", &canonical_frame(35)).unwrap();

        assert!(!cache.is_valid("TEST", Period::TwoYears));
        assert!(cache.load("TEST", Period::TwoYears).is_none());

        cache.save("TEST", Period::TwoYears, &series).unwrap();
        assert!(cache.is_valid("TEST", Period::TwoYears));

        let meta = cache.meta("TEST", Period::TwoYears).unwrap();
        assert_eq!(meta.rows, 35);
        assert_eq!(meta.period, "2y");
        assert_eq!(meta.source, DATA_SOURCE);
        assert_eq!(meta.columns, CANONICAL_COLUMNS.to_vec());

        let loaded = cache.load("TEST", Period::TwoYears).unwrap();
        assert_eq!(validate("TEST", &loaded).unwrap(), series);

        cache.clear("TEST", Period::TwoYears).unwrap();
        assert!(!cache.is_valid("TEST", Period::TwoYears));
        assert!(cache.load("TEST", Period::TwoYears).is_none());
    }

    #[test]
    fn test_expiry() {
        let temp_dir = tempdir().unwrap();
        let cache = cache_in(temp_dir.path());
        let series = validate("TEST", &canonical_frame(30)).unwrap();
        cache.save("TEST", Period::OneYear, &series).unwrap();

        let now = Local::now();
        assert!(cache.is_valid_at("TEST", Period::OneYear, now));
        assert!(!cache.is_valid_at("TEST", Period::OneYear, now + Duration::days(2)));
    }

    #[test]
    fn test_corrupt_entries_are_misses() {
        let temp_dir = tempdir().unwrap();
        let cache = cache_in(temp_dir.path());

        fs::write(cache.meta_path("BAD", Period::TwoYears), "{ not json").unwrap();
        fs::write(cache.data_path("BAD", Period::TwoYears), "date,Open\nyesterday,abc\n").unwrap();

        assert!(!cache.is_valid("BAD", Period::TwoYears));
        assert!(cache.meta("BAD", Period::TwoYears).is_none());
        assert!(cache.load("BAD", Period::TwoYears).is_none());
    }

    #[test]
    fn test_clear_and_info() {
        let temp_dir = tempdir().unwrap();
        let cache = cache_in(temp_dir.path());
        let series = validate("AAA", &canonical_frame(30)).unwrap();

        cache.save("AAA", Period::OneYear, &series).unwrap();
        cache.save("AAA", Period::TwoYears, &series).unwrap();
        cache.save("BBB", Period::TwoYears, &series).unwrap();

        let info = cache.info().unwrap();
        assert_eq!(info.total_files, 3);
        assert_eq!(info.cached_tickers, vec!["AAA", "BBB"]);

        cache.clear_ticker("AAA").unwrap();
        assert_eq!(cache.info().unwrap().cached_tickers, vec!["BBB"]);

        cache.clear_all().unwrap();
        assert_eq!(cache.info().unwrap().total_files, 0);
    }
}
