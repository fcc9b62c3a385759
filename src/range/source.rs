//! Candle sources consumed by the range resolver.
//!
//! A source hands back the candles of one asset at one interval whose
//! `open_time` falls inside an inclusive window, ordered by time. Remote
//! fetching and backfill are not done here; a source only serves what it has.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::errors::RangeError;
use super::structs::{Candle, Interval, TimestampMS};

pub trait CandleSource {
    /// Candles of `asset` at `interval` with `from <= open_time <= to`, ascending by time
    fn candles(
        &self,
        asset: &str,
        interval: Interval,
        from: TimestampMS,
        to: TimestampMS,
    ) -> Result<Vec<Candle>, RangeError>;
}

impl<S: CandleSource + ?Sized> CandleSource for &S {
    fn candles(
        &self,
        asset: &str,
        interval: Interval,
        from: TimestampMS,
        to: TimestampMS,
    ) -> Result<Vec<Candle>, RangeError> {
        (**self).candles(asset, interval, from, to)
    }
}

/// In-memory source keyed by asset and interval
#[derive(Debug, Clone, Default)]
pub struct InMemoryCandleSource {
    series: HashMap<(String, Interval), Vec<Candle>>,
}

impl InMemoryCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series, replacing any previous one for the same asset and interval
    pub fn insert(&mut self, asset: &str, interval: Interval, mut candles: Vec<Candle>) {
        candles.sort_by_key(|candle| candle.open_time);
        self.series.insert((asset.to_string(), interval), candles);
    }

    pub fn with_series(mut self, asset: &str, interval: Interval, candles: Vec<Candle>) -> Self {
        self.insert(asset, interval, candles);
        self
    }
}

impl CandleSource for InMemoryCandleSource {
    fn candles(
        &self,
        asset: &str,
        interval: Interval,
        from: TimestampMS,
        to: TimestampMS,
    ) -> Result<Vec<Candle>, RangeError> {
        let series = self
            .series
            .get(&(asset.to_string(), interval))
            .ok_or_else(|| RangeError::SourceUnavailable {
                asset: asset.to_string(),
                interval,
                reason: "series not loaded".to_string(),
            })?;

        Ok(series
            .iter()
            .filter(|candle| candle.open_time >= from && candle.open_time <= to)
            .copied()
            .collect())
    }
}

/// Row layout of the CSV files read by [`CsvCandleSource`]
#[derive(Debug, Deserialize)]
struct CsvCandleRow {
    open_time: TimestampMS,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<CsvCandleRow> for Candle {
    fn from(row: CsvCandleRow) -> Self {
        Candle::new(row.open_time, row.open, row.high, row.low, row.close, row.volume)
    }
}

/// Reads `<data_dir>/<ASSET>_<interval>.csv` files with an
/// `open_time,open,high,low,close,volume` header
#[derive(Debug, Clone)]
pub struct CsvCandleSource {
    data_dir: PathBuf,
}

impl CsvCandleSource {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn file_path(&self, asset: &str, interval: Interval) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}.csv", asset.to_uppercase(), interval.as_str()))
    }
}

impl CandleSource for CsvCandleSource {
    fn candles(
        &self,
        asset: &str,
        interval: Interval,
        from: TimestampMS,
        to: TimestampMS,
    ) -> Result<Vec<Candle>, RangeError> {
        let path = self.file_path(asset, interval);
        if !path.exists() {
            return Err(RangeError::SourceUnavailable {
                asset: asset.to_string(),
                interval,
                reason: format!("{} not found", path.display()),
            });
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut candles = Vec::new();
        for row in reader.deserialize::<CsvCandleRow>() {
            let candle = Candle::from(row?);
            if candle.open_time >= from && candle.open_time <= to {
                candles.push(candle);
            }
        }
        candles.sort_by_key(|candle| candle.open_time);

        debug!(
            path = %path.display(),
            candles = candles.len(),
            "Loaded candles from CSV"
        );
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn minute(n: i64) -> TimestampMS {
        1736985600000 + n * 60_000
    }

    #[test]
    fn test_in_memory_source_filters_and_sorts() {
        let source = InMemoryCandleSource::new().with_series(
            "BTCUSDT",
            Interval::OneMinute,
            vec![
                Candle::from_range(minute(2), 101.0, 100.0, 1.0),
                Candle::from_range(minute(0), 101.0, 100.0, 1.0),
                Candle::from_range(minute(1), 101.0, 100.0, 1.0),
                Candle::from_range(minute(3), 101.0, 100.0, 1.0),
            ],
        );

        let candles = source.candles("BTCUSDT", Interval::OneMinute, minute(1), minute(2)).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, minute(1));
        assert_eq!(candles[1].open_time, minute(2));
    }

    #[test]
    fn test_in_memory_source_unknown_series() {
        let source = InMemoryCandleSource::new();
        let result = source.candles("ETHUSDT", Interval::FiveMinutes, 0, 1);
        assert!(matches!(result, Err(RangeError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_csv_source_reads_window() {
        let temp_dir = TempDir::new().unwrap();
        let source = CsvCandleSource::new(temp_dir.path());
        let path = source.file_path("btcusdt", Interval::OneMinute);
        assert!(path.ends_with("BTCUSDT_1M.csv"));

        let mut content = String::from("open_time,open,high,low,close,volume\n");
        for n in 0..5 {
            content.push_str(&format!("{},100.0,101.0,99.0,100.5,{}\n", minute(n), 10 * (n + 1)));
        }
        std::fs::write(&path, content).unwrap();

        let candles = source.candles("BTCUSDT", Interval::OneMinute, minute(1), minute(3)).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].volume, 20.0);
        assert_eq!(candles[2].open_time, minute(3));
        assert_eq!(candles[2].high, 101.0);
    }

    #[test]
    fn test_csv_source_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = CsvCandleSource::new(temp_dir.path());
        let result = source.candles("BTCUSDT", Interval::FifteenMinutes, 0, 1);
        assert!(matches!(result, Err(RangeError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_csv_source_malformed_row() {
        let temp_dir = TempDir::new().unwrap();
        let source = CsvCandleSource::new(temp_dir.path());
        std::fs::write(
            source.file_path("BTCUSDT", Interval::OneMinute),
            "open_time,open,high,low,close,volume\nabc,1,2,0.5,1,10\n",
        )
        .unwrap();

        let result = source.candles("BTCUSDT", Interval::OneMinute, 0, i64::MAX);
        assert!(matches!(result, Err(RangeError::Csv(_))));
    }
}
