//! Fixed-resolution volume histogram.
//!
//! The price range `[lowest, highest]` of a candle series is cut into
//! `bucket_count` equal-height buckets. Bucket 0 sits at the top (highest
//! price), bucket `bucket_count - 1` at the bottom.

use tracing::debug;

use crate::common::constants::INDEX_ROUNDING_DECIMALS;
use crate::common::round_to;
use crate::range::structs::Candle;
use super::errors::VolumeProfileError;
use super::structs::VolumeSplitMode;
use super::validation::{price_range, validate_candles};

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeHistogram {
    highest: f64,
    lowest: f64,
    price_step: f64,
    volumes: Vec<f64>,
}

impl VolumeHistogram {
    /// Build the histogram for a candle series
    pub fn build(
        candles: &[Candle],
        bucket_count: usize,
        mode: VolumeSplitMode,
    ) -> Result<Self, VolumeProfileError> {
        validate_candles(candles)?;
        let (lowest, highest) = price_range(candles);

        let mut histogram = Self::empty(highest, lowest, bucket_count)?;
        for candle in candles {
            histogram.add_candle(candle, mode);
        }

        debug!(
            candles = candles.len(),
            buckets = bucket_count,
            highest,
            lowest,
            price_step = histogram.price_step,
            total_volume = histogram.total_volume(),
            "Built volume histogram"
        );

        Ok(histogram)
    }

    /// Wrap precomputed bucket volumes (highest price first)
    pub fn from_volumes(highest: f64, lowest: f64, volumes: Vec<f64>) -> Result<Self, VolumeProfileError> {
        let mut histogram = Self::empty(highest, lowest, volumes.len())?;
        for (index, value) in volumes.iter().enumerate() {
            if !value.is_finite() || *value < 0.0 {
                return Err(VolumeProfileError::InvalidCandle {
                    index,
                    field: "volume",
                    value: *value,
                    reason: "bucket volume must be finite and non-negative",
                });
            }
        }
        if !volumes.iter().sum::<f64>().is_finite() {
            return Err(VolumeProfileError::VolumeOverflow { index: volumes.len() - 1 });
        }
        histogram.volumes = volumes;
        Ok(histogram)
    }

    fn empty(highest: f64, lowest: f64, bucket_count: usize) -> Result<Self, VolumeProfileError> {
        if bucket_count == 0 {
            return Err(VolumeProfileError::EmptyInput);
        }
        if !highest.is_finite() || !lowest.is_finite() || highest < lowest {
            return Err(VolumeProfileError::InvalidConfig(format!(
                "invalid histogram price range [{}, {}]",
                lowest, highest
            )));
        }
        if highest == lowest {
            return Err(VolumeProfileError::DegenerateRange { price: highest });
        }

        Ok(Self {
            highest,
            lowest,
            price_step: (highest - lowest) / bucket_count as f64,
            volumes: vec![0.0; bucket_count],
        })
    }

    pub fn bucket_count(&self) -> usize {
        self.volumes.len()
    }

    pub fn highest(&self) -> f64 {
        self.highest
    }

    pub fn lowest(&self) -> f64 {
        self.lowest
    }

    pub fn price_step(&self) -> f64 {
        self.price_step
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    pub fn volume(&self, index: usize) -> f64 {
        self.volumes[index]
    }

    pub fn total_volume(&self) -> f64 {
        self.volumes.iter().sum()
    }

    pub fn price_top(&self, index: usize) -> f64 {
        self.highest - index as f64 * self.price_step
    }

    pub fn price_bottom(&self, index: usize) -> f64 {
        self.highest - (index + 1) as f64 * self.price_step
    }

    pub fn midpoint(&self, index: usize) -> f64 {
        (self.price_top(index) + self.price_bottom(index)) / 2.0
    }

    /// Index of the highest-volume bucket; ties go to the higher price
    pub fn poc_index(&self) -> usize {
        let mut best = 0;
        for (index, volume) in self.volumes.iter().enumerate().skip(1) {
            if *volume > self.volumes[best] {
                best = index;
            }
        }
        best
    }

    pub fn poc_price(&self) -> f64 {
        self.midpoint(self.poc_index())
    }

    /// `(start, end)` bucket indices touched by a `[low, high]` price range
    ///
    /// The scaled offsets are rounded to two decimals before `floor`/`ceil`
    /// so prices sitting on a bucket boundary land on the correct side of it.
    pub fn bucket_span(&self, high: f64, low: f64) -> (usize, usize) {
        let last = self.bucket_count() - 1;
        let start = round_to((self.highest - high) / self.price_step, INDEX_ROUNDING_DECIMALS).floor();
        let end = round_to((self.highest - low) / self.price_step, INDEX_ROUNDING_DECIMALS).ceil() - 1.0;

        let start = (start.max(0.0) as usize).min(last);
        // A zero-height range on a boundary yields end = start - 1
        let end = (end.max(0.0) as usize).min(last).max(start);
        (start, end)
    }

    /// Share of bucket `index` lying below `high`, in [0, 1]
    fn top_overlap(&self, index: usize, high: f64) -> f64 {
        (1.0 - (self.price_top(index) - high) / self.price_step).clamp(0.0, 1.0)
    }

    /// Share of bucket `index` lying above `low`, in [0, 1]
    fn bottom_overlap(&self, index: usize, low: f64) -> f64 {
        ((self.price_top(index) - low) / self.price_step).clamp(0.0, 1.0)
    }

    fn add_candle(&mut self, candle: &Candle, mode: VolumeSplitMode) {
        let volume = candle.volume;
        if volume == 0.0 {
            return;
        }

        let (start, end) = self.bucket_span(candle.high, candle.low);
        if start == end {
            self.volumes[start] += volume;
            return;
        }

        let span = (end - start + 1) as f64;
        let top_weight = self.top_overlap(start, candle.high);
        let bottom_weight = self.bottom_overlap(end, candle.low);

        let unit = match mode {
            VolumeSplitMode::EdgeTruncated => volume / span,
            VolumeSplitMode::OverlapWeighted => {
                let total_weight = top_weight + bottom_weight + (span - 2.0);
                if total_weight <= 0.0 {
                    // Both edges empty on a two-bucket span; fall back to an even split
                    let share = volume / span;
                    self.volumes[start] += share;
                    self.volumes[end] += share;
                    return;
                }
                volume / total_weight
            }
        };

        self.volumes[start] += unit * top_weight;
        for bucket in &mut self.volumes[start + 1..end] {
            *bucket += unit;
        }
        self.volumes[end] += unit * bottom_weight;
    }

    pub fn into_volumes(self) -> Vec<f64> {
        self.volumes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(high: f64, low: f64, volume: f64) -> Candle {
        Candle::from_range(0, high, low, volume)
    }

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_bucket_geometry() {
        let histogram = VolumeHistogram::from_volumes(110.0, 100.0, vec![0.0; 10]).unwrap();
        assert_eq!(histogram.bucket_count(), 10);
        assert_close(histogram.price_step(), 1.0);
        assert_close(histogram.price_top(0), 110.0);
        assert_close(histogram.price_bottom(0), 109.0);
        assert_close(histogram.midpoint(9), 100.5);
    }

    #[test]
    fn test_bucket_span_on_boundaries() {
        let histogram = VolumeHistogram::from_volumes(110.0, 100.0, vec![0.0; 10]).unwrap();
        // Exactly three buckets: 108-107, 107-106, 106-105
        assert_eq!(histogram.bucket_span(108.0, 105.0), (2, 4));
        // Entire range
        assert_eq!(histogram.bucket_span(110.0, 100.0), (0, 9));
        // Inside one bucket
        assert_eq!(histogram.bucket_span(107.8, 107.2), (2, 2));
        // Zero-height candles on boundaries stay in range
        assert_eq!(histogram.bucket_span(107.0, 107.0), (3, 3));
        assert_eq!(histogram.bucket_span(110.0, 110.0), (0, 0));
        assert_eq!(histogram.bucket_span(100.0, 100.0), (9, 9));
    }

    #[test]
    fn test_bucket_span_absorbs_float_noise() {
        let histogram = VolumeHistogram::from_volumes(0.3, 0.0, vec![0.0; 3]).unwrap();
        // 0.3 - 0.1 = 0.19999999999999998, still the boundary between buckets 0 and 1
        assert_eq!(histogram.bucket_span(0.3 - 0.1, 0.1), (1, 1));
    }

    #[test]
    fn test_single_bucket_candle_gets_full_volume() {
        let candles = vec![candle(110.0, 100.0, 1.0), candle(107.8, 107.2, 500.0)];
        let histogram = VolumeHistogram::build(&candles, 10, VolumeSplitMode::OverlapWeighted).unwrap();
        // Background candle adds 0.1 to each bucket
        assert_close(histogram.volume(2), 500.1);
        assert_close(histogram.volume(1), 0.1);
        assert_close(histogram.volume(3), 0.1);
    }

    #[test]
    fn test_single_bucket_candle_full_volume_in_truncated_mode() {
        let candles = vec![candle(110.0, 100.0, 0.0), candle(107.8, 107.2, 500.0)];
        let histogram = VolumeHistogram::build(&candles, 10, VolumeSplitMode::EdgeTruncated).unwrap();
        assert_close(histogram.volume(2), 500.0);
        assert_close(histogram.total_volume(), 500.0);
    }

    #[test]
    fn test_overlap_weighted_edges() {
        // Covers half of bucket 2, all of 3 and half of 4
        let candles = vec![candle(110.0, 100.0, 0.0), candle(107.5, 105.5, 100.0)];
        let histogram = VolumeHistogram::build(&candles, 10, VolumeSplitMode::OverlapWeighted).unwrap();
        assert_close(histogram.volume(2), 25.0);
        assert_close(histogram.volume(3), 50.0);
        assert_close(histogram.volume(4), 25.0);
        assert_close(histogram.total_volume(), 100.0);
    }

    #[test]
    fn test_edge_truncated_shares() {
        let candles = vec![candle(110.0, 100.0, 0.0), candle(107.5, 105.5, 90.0)];
        let histogram = VolumeHistogram::build(&candles, 10, VolumeSplitMode::EdgeTruncated).unwrap();
        // Even share 30, edges cover half their bucket
        assert_close(histogram.volume(2), 15.0);
        assert_close(histogram.volume(3), 30.0);
        assert_close(histogram.volume(4), 15.0);
        assert_close(histogram.total_volume(), 60.0);
    }

    #[test]
    fn test_volume_conservation() {
        let candles: Vec<Candle> = (0..200)
            .map(|n| {
                let base = 100.0 + (n as f64 * 0.37).sin() * 7.0;
                let height = 0.05 + (n % 11) as f64 * 0.61;
                candle(base + height, base, 10.0 + (n % 7) as f64 * 13.3)
            })
            .collect();
        let expected: f64 = candles.iter().map(|c| c.volume).sum();

        let histogram = VolumeHistogram::build(&candles, 240, VolumeSplitMode::OverlapWeighted).unwrap();
        assert_close(histogram.total_volume(), expected);
        assert!(histogram.volumes().iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_poc_ties_resolve_to_higher_price() {
        let histogram = VolumeHistogram::from_volumes(110.0, 100.0, vec![1.0, 5.0, 3.0, 5.0, 0.0]).unwrap();
        assert_eq!(histogram.poc_index(), 1);
        assert_close(histogram.poc_price(), 107.0);
    }

    #[test]
    fn test_degenerate_range() {
        let candles = vec![candle(100.0, 100.0, 10.0), candle(100.0, 100.0, 5.0)];
        assert_eq!(
            VolumeHistogram::build(&candles, 240, VolumeSplitMode::OverlapWeighted),
            Err(VolumeProfileError::DegenerateRange { price: 100.0 })
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            VolumeHistogram::build(&[], 240, VolumeSplitMode::OverlapWeighted),
            Err(VolumeProfileError::EmptyInput)
        );
    }

    #[test]
    fn test_from_volumes_rejects_bad_bucket() {
        assert!(VolumeHistogram::from_volumes(110.0, 100.0, vec![1.0, f64::NAN]).is_err());
        assert!(VolumeHistogram::from_volumes(110.0, 100.0, vec![1.0, -1.0]).is_err());
        assert_eq!(
            VolumeHistogram::from_volumes(110.0, 100.0, vec![f64::MAX, f64::MAX, 1.0]),
            Err(VolumeProfileError::VolumeOverflow { index: 2 })
        );
    }
}
