#![allow(dead_code)]

use std::path::Path;

use volume_profiler::range::{Candle, Interval, TimestampMS};

/// 2025-01-16 00:00:00 UTC
pub const BASE_TIMESTAMP: TimestampMS = 1_736_985_600_000;

/// Create a sample candle with open/close at the middle of its range
pub fn create_sample_candle(timestamp: TimestampMS, high: f64, low: f64, volume: f64) -> Candle {
    Candle::from_range(timestamp, high, low, volume)
}

/// Ten identical candles `high=110, low=100, volume=1000`
pub fn create_flat_series() -> Vec<Candle> {
    (0..10)
        .map(|n| create_sample_candle(BASE_TIMESTAMP + n * 60_000, 110.0, 100.0, 1000.0))
        .collect()
}

/// Flat series with a `200/190` candle of volume 100000 in the middle
pub fn create_spike_series() -> Vec<Candle> {
    let mut candles = create_flat_series();
    candles.insert(5, create_sample_candle(BASE_TIMESTAMP + 5 * 60_000, 200.0, 190.0, 100_000.0));
    candles
}

/// Deterministic wave-shaped 1-minute series starting at `start`
pub fn create_minute_series(start: TimestampMS, count: i64) -> Vec<Candle> {
    (0..count)
        .map(|n| {
            let center = 50_000.0 + (n as f64 / 15.0).sin() * 250.0;
            let spread = 5.0 + (n % 7) as f64;
            let volume = 10.0 + ((n * 13) % 29) as f64;
            create_sample_candle(start + n * 60_000, center + spread, center - spread, volume)
        })
        .collect()
}

/// Write candles as `<dir>/<ASSET>_<interval>.csv`
pub fn write_candle_csv(dir: &Path, asset: &str, interval: Interval, candles: &[Candle]) {
    let path = dir.join(format!("{}_{}.csv", asset, interval));
    let mut content = String::from("open_time,open,high,low,close,volume\n");
    for candle in candles {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            candle.open_time, candle.open, candle.high, candle.low, candle.close, candle.volume
        ));
    }
    std::fs::write(path, content).expect("Failed to write candle CSV");
}
