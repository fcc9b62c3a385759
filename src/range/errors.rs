use thiserror::Error;

use crate::volume_profile::errors::VolumeProfileError;
use super::structs::{Interval, TimestampMS};

#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Unknown interval: {0}")]
    UnknownInterval(String),
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("Range start {start} is after range end {end}")]
    InvertedRange { start: TimestampMS, end: TimestampMS },
    #[error("No interval up to {requested} keeps the window under {max_candles} candles")]
    TooManyCandles { requested: Interval, max_candles: i64 },
    #[error("Missing {asset} {interval} candle at boundary {timestamp}")]
    MissingBoundaryCandle {
        asset: String,
        interval: Interval,
        timestamp: TimestampMS,
    },
    #[error("No candle data for {asset} {interval}: {reason}")]
    SourceUnavailable {
        asset: String,
        interval: Interval,
        reason: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Profile(#[from] VolumeProfileError),
}
