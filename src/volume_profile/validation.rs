//! Input validation for candle series entering the histogram builder.
//!
//! Every check fails fast on the first offending candle so NaN or infinite
//! values never reach the bucket arithmetic.

use crate::range::structs::Candle;
use super::errors::VolumeProfileError;

/// Reject empty series, non-finite or negative fields, inverted candles and
/// series whose summed volume overflows
pub fn validate_candles(candles: &[Candle]) -> Result<(), VolumeProfileError> {
    if candles.is_empty() {
        return Err(VolumeProfileError::EmptyInput);
    }

    let mut total_volume = 0.0;
    for (index, candle) in candles.iter().enumerate() {
        for (field, value) in [("high", candle.high), ("low", candle.low), ("volume", candle.volume)] {
            if !value.is_finite() {
                return Err(VolumeProfileError::InvalidCandle {
                    index,
                    field,
                    value,
                    reason: "must be finite",
                });
            }
            if value < 0.0 {
                return Err(VolumeProfileError::InvalidCandle {
                    index,
                    field,
                    value,
                    reason: "must not be negative",
                });
            }
        }

        if candle.high < candle.low {
            return Err(VolumeProfileError::InvalidCandle {
                index,
                field: "high",
                value: candle.high,
                reason: "must not be below low",
            });
        }

        total_volume += candle.volume;
        if !total_volume.is_finite() {
            return Err(VolumeProfileError::VolumeOverflow { index });
        }
    }

    Ok(())
}

/// `(lowest low, highest high)` over a validated series
pub fn price_range(candles: &[Candle]) -> (f64, f64) {
    candles.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lowest, highest), candle| {
        (lowest.min(candle.low), highest.max(candle.high))
    })
}
