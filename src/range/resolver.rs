//! Range resolution: picks the candle interval for a requested window, aligns
//! the window to that interval and slices the candles out of a source.

use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::common::constants::{DEFAULT_MAX_CANDLES, RANGE_TIMESTAMP_FORMAT};
use super::errors::RangeError;
use super::source::CandleSource;
use super::structs::{Candle, Interval, TimestampMS};

/// Parse a `"%Y-%m-%d %H:%M:%S"` UTC timestamp into epoch milliseconds
pub fn parse_range_timestamp(value: &str) -> Result<TimestampMS, RangeError> {
    NaiveDateTime::parse_from_str(value.trim(), RANGE_TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
        .map_err(|e| RangeError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Format epoch milliseconds back into the range timestamp format
pub fn format_range_timestamp(timestamp: TimestampMS) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.format(RANGE_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// A request for the candles of one asset over `[start, end]`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRequest {
    pub asset: String,
    pub interval: Interval,
    pub start: TimestampMS,
    pub end: TimestampMS,
}

impl RangeRequest {
    pub fn new(asset: &str, interval: Interval, start: TimestampMS, end: TimestampMS) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::InvertedRange { start, end });
        }
        Ok(Self {
            asset: asset.to_string(),
            interval,
            start,
            end,
        })
    }

    /// Build a request from the textual interval and timestamps
    pub fn parse(asset: &str, interval: &str, start: &str, end: &str) -> Result<Self, RangeError> {
        Self::new(
            asset,
            interval.parse()?,
            parse_range_timestamp(start)?,
            parse_range_timestamp(end)?,
        )
    }
}

/// Candles covering a request at the resolved interval
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRange {
    pub asset: String,
    pub requested_interval: Interval,
    pub resolved_interval: Interval,
    /// Aligned window start (first candle open time)
    pub start: TimestampMS,
    /// Last open time included in the window
    pub end: TimestampMS,
    pub candles: Vec<Candle>,
    /// Missing candles detected inside the window
    pub gap_count: usize,
}

pub struct RangeResolver<S: CandleSource> {
    source: S,
    max_candles: i64,
}

impl<S: CandleSource> RangeResolver<S> {
    pub fn new(source: S) -> Self {
        Self::with_max_candles(source, DEFAULT_MAX_CANDLES)
    }

    pub fn with_max_candles(source: S, max_candles: i64) -> Self {
        Self {
            source,
            max_candles: max_candles.max(1),
        }
    }

    pub fn max_candles(&self) -> i64 {
        self.max_candles
    }

    /// Finest interval, up to the requested one, that keeps the window at or under `max_candles`
    pub fn resolve_interval(&self, request: &RangeRequest) -> Result<Interval, RangeError> {
        let span = request.end - request.start;
        request
            .interval
            .ladder_up_to()
            .iter()
            .copied()
            .find(|interval| span / interval.duration_ms() <= self.max_candles)
            .ok_or(RangeError::TooManyCandles {
                requested: request.interval,
                max_candles: self.max_candles,
            })
    }

    /// Resolve the interval, align the window and slice the candles out of the source
    pub fn resolve(&self, request: &RangeRequest) -> Result<ResolvedRange, RangeError> {
        let resolved = self.resolve_interval(request)?;
        let start = resolved.align(request.start);
        let aligned_end = resolved.align(request.end);
        // Extend so the requested interval's final candle is covered at the finer resolution
        let end = aligned_end + request.interval.duration_ms() - resolved.duration_ms();

        debug!(
            asset = %request.asset,
            requested = %request.interval,
            resolved = %resolved,
            start = %format_range_timestamp(start),
            end = %format_range_timestamp(end),
            "Resolved candle window"
        );

        let candles = self.source.candles(&request.asset, resolved, start, end)?;

        for boundary in [start, aligned_end] {
            if !candles.iter().any(|candle| candle.open_time == boundary) {
                return Err(RangeError::MissingBoundaryCandle {
                    asset: request.asset.clone(),
                    interval: resolved,
                    timestamp: boundary,
                });
            }
        }

        let gap_count = count_gaps(&candles, resolved);
        if gap_count > 0 {
            warn!(
                asset = %request.asset,
                interval = %resolved,
                gap_count,
                "Candle window contains gaps"
            );
        }

        info!(
            "Resolved {} {} -> {} window with {} candles",
            request.asset,
            request.interval,
            resolved,
            candles.len()
        );

        Ok(ResolvedRange {
            asset: request.asset.clone(),
            requested_interval: request.interval,
            resolved_interval: resolved,
            start,
            end,
            candles,
            gap_count,
        })
    }
}

/// Number of candles missing between consecutive open times
fn count_gaps(candles: &[Candle], interval: Interval) -> usize {
    let step = interval.duration_ms();
    candles
        .windows(2)
        .map(|pair| {
            let delta = pair[1].open_time - pair[0].open_time;
            if delta > step {
                ((delta / step) - 1) as usize
            } else {
                0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::source::InMemoryCandleSource;

    const BASE: TimestampMS = 1736985600000; // 2025-01-16 00:00:00 UTC

    fn series(interval: Interval, count: i64) -> Vec<Candle> {
        (0..count)
            .map(|n| Candle::from_range(BASE + n * interval.duration_ms(), 101.0, 100.0, 10.0))
            .collect()
    }

    #[test]
    fn test_parse_range_timestamp() {
        assert_eq!(parse_range_timestamp("2025-01-16 00:00:00").unwrap(), BASE);
        assert_eq!(format_range_timestamp(BASE), "2025-01-16 00:00:00");
        assert!(matches!(
            parse_range_timestamp("2025-01-16T00:00:00Z"),
            Err(RangeError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_request_rejects_inverted_range() {
        let result = RangeRequest::parse("BTCUSDT", "5M", "2025-01-16 01:00:00", "2025-01-16 00:00:00");
        assert!(matches!(result, Err(RangeError::InvertedRange { .. })));
    }

    #[test]
    fn test_resolve_interval_prefers_finest_that_fits() {
        let resolver = RangeResolver::new(InMemoryCandleSource::new());

        // One day: 1440 one-minute candles fit under 5000
        let request = RangeRequest::new("BTCUSDT", Interval::SixtyMinutes, BASE, BASE + 86_400_000).unwrap();
        assert_eq!(resolver.resolve_interval(&request).unwrap(), Interval::OneMinute);

        // Ten days: 14400 minutes, 4800 three-minute candles
        let request = RangeRequest::new("BTCUSDT", Interval::SixtyMinutes, BASE, BASE + 10 * 86_400_000).unwrap();
        assert_eq!(resolver.resolve_interval(&request).unwrap(), Interval::ThreeMinutes);
    }

    #[test]
    fn test_resolve_interval_never_exceeds_requested() {
        let resolver = RangeResolver::with_max_candles(InMemoryCandleSource::new(), 10);
        let request = RangeRequest::new("BTCUSDT", Interval::FiveMinutes, BASE, BASE + 86_400_000).unwrap();
        assert!(matches!(
            resolver.resolve_interval(&request),
            Err(RangeError::TooManyCandles { requested: Interval::FiveMinutes, max_candles: 10 })
        ));
    }

    #[test]
    fn test_resolve_aligns_three_minute_window() {
        let source = InMemoryCandleSource::new().with_series("BTCUSDT", Interval::ThreeMinutes, series(Interval::ThreeMinutes, 20));
        let resolver = RangeResolver::with_max_candles(&source, 10);
        // 20 minute span is 20 one-minute candles, too many; 3M gives 6
        let request = RangeRequest::new("BTCUSDT", Interval::ThreeMinutes, BASE + 4 * 60_000, BASE + 24 * 60_000).unwrap();

        let resolved = resolver.resolve(&request).unwrap();
        assert_eq!(resolved.resolved_interval, Interval::ThreeMinutes);
        assert_eq!(resolved.start, BASE + 3 * 60_000);
        assert_eq!(resolved.end, BASE + 24 * 60_000);
        assert_eq!(resolved.candles.first().unwrap().open_time, BASE + 3 * 60_000);
        assert_eq!(resolved.candles.last().unwrap().open_time, BASE + 24 * 60_000);
        assert_eq!(resolved.candles.len(), 8);
        assert_eq!(resolved.gap_count, 0);
    }

    #[test]
    fn test_resolve_covers_final_requested_candle() {
        let source = InMemoryCandleSource::new().with_series("BTCUSDT", Interval::OneMinute, series(Interval::OneMinute, 60));
        let resolver = RangeResolver::new(&source);
        let request = RangeRequest::new("BTCUSDT", Interval::FiveMinutes, BASE, BASE + 10 * 60_000).unwrap();

        let resolved = resolver.resolve(&request).unwrap();
        assert_eq!(resolved.resolved_interval, Interval::OneMinute);
        // Minutes 0..=14: the 5M candle opening at minute 10 spans minutes 10-14
        assert_eq!(resolved.candles.len(), 15);
        assert_eq!(resolved.end, BASE + 14 * 60_000);
    }

    #[test]
    fn test_resolve_missing_boundary_candle() {
        let mut candles = series(Interval::OneMinute, 30);
        candles.retain(|candle| candle.open_time != BASE + 20 * 60_000);
        let source = InMemoryCandleSource::new().with_series("BTCUSDT", Interval::OneMinute, candles);
        let resolver = RangeResolver::new(&source);
        let request = RangeRequest::new("BTCUSDT", Interval::OneMinute, BASE, BASE + 20 * 60_000).unwrap();

        match resolver.resolve(&request) {
            Err(RangeError::MissingBoundaryCandle { timestamp, .. }) => assert_eq!(timestamp, BASE + 20 * 60_000),
            other => panic!("expected missing boundary candle, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_counts_gaps() {
        let mut candles = series(Interval::OneMinute, 30);
        candles.retain(|candle| candle.open_time != BASE + 5 * 60_000 && candle.open_time != BASE + 6 * 60_000);
        let source = InMemoryCandleSource::new().with_series("BTCUSDT", Interval::OneMinute, candles);
        let resolver = RangeResolver::new(&source);
        let request = RangeRequest::new("BTCUSDT", Interval::OneMinute, BASE, BASE + 10 * 60_000).unwrap();

        let resolved = resolver.resolve(&request).unwrap();
        assert_eq!(resolved.gap_count, 2);
        assert_eq!(resolved.candles.len(), 9);
    }
}
