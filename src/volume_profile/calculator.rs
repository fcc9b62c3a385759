use rayon::prelude::*;
use tracing::{debug, info};

use crate::common::constants::OUTPUT_PRICE_DECIMALS;
use crate::common::round_to;
use crate::range::errors::RangeError;
use crate::range::resolver::{RangeRequest, RangeResolver};
use crate::range::source::CandleSource;
use crate::range::structs::Candle;
use super::errors::VolumeProfileError;
use super::histogram::VolumeHistogram;
use super::structs::{ProfileResult, VolumeProfileConfig};
use super::tiers::{classify_tiers, dominant_tier};
use super::value_area::expand_value_area;

/// Volume profile calculator: histogram, POC, value area and dominant tier
///
/// Holds only configuration. Every call builds a fresh histogram, so one
/// calculator can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct VolumeProfileCalculator {
    config: VolumeProfileConfig,
}

impl VolumeProfileCalculator {
    /// Create a calculator, rejecting invalid configuration up front
    pub fn new(config: VolumeProfileConfig) -> Result<Self, VolumeProfileError> {
        config.validate().map_err(VolumeProfileError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VolumeProfileConfig {
        &self.config
    }

    /// Build the histogram for a candle series with this calculator's resolution
    pub fn histogram(&self, candles: &[Candle]) -> Result<VolumeHistogram, VolumeProfileError> {
        VolumeHistogram::build(candles, self.config.bucket_count, self.config.volume_split_mode)
    }

    /// Compute the profile of an ordered candle series
    pub fn calculate(&self, candles: &[Candle]) -> Result<ProfileResult, VolumeProfileError> {
        let histogram = self.histogram(candles)?;
        Ok(self.profile_from_histogram(histogram))
    }

    /// Resolve POC, value area and tiers for an already built histogram
    pub fn profile_from_histogram(&self, histogram: VolumeHistogram) -> ProfileResult {
        let poc_price = histogram.poc_price();
        let value_area = expand_value_area(&histogram, self.config.value_area_fraction());
        let tiers = classify_tiers(&value_area);
        let dominant = dominant_tier(&tiers, self.config.tier_tie_break, poc_price);

        let result = ProfileResult {
            poc: round_to(poc_price, OUTPUT_PRICE_DECIMALS),
            vah: round_to(value_area.high, OUTPUT_PRICE_DECIMALS),
            val: round_to(value_area.low, OUTPUT_PRICE_DECIMALS),
            dominant_tier: dominant,
            tiers,
            value_area_volume: value_area.volume,
            total_volume: histogram.total_volume(),
            bucket_count: histogram.bucket_count(),
            price_step: histogram.price_step(),
            heatmap: None,
        };

        debug!(
            poc = result.poc,
            vah = result.vah,
            val = result.val,
            dominant = %result.dominant_tier.name,
            value_area_pct = value_area.volume_percentage,
            "Volume profile resolved"
        );

        if self.config.include_heatmap {
            ProfileResult {
                heatmap: Some(histogram.into_volumes()),
                ..result
            }
        } else {
            result
        }
    }

    /// Compute independent profiles in parallel, one result per input series
    pub fn calculate_batch<T>(&self, series: &[T]) -> Vec<Result<ProfileResult, VolumeProfileError>>
    where
        T: AsRef<[Candle]> + Sync,
    {
        info!("Calculating {} volume profiles in parallel", series.len());
        series
            .par_iter()
            .map(|candles| self.calculate(candles.as_ref()))
            .collect()
    }

    /// Resolve the candle window for `request` and profile it
    pub fn calculate_range<S: CandleSource>(
        &self,
        resolver: &RangeResolver<S>,
        request: &RangeRequest,
    ) -> Result<ProfileResult, RangeError> {
        let range = resolver.resolve(request)?;
        let result = self.calculate(&range.candles)?;

        debug!(
            asset = %request.asset,
            interval = %range.resolved_interval,
            candles = range.candles.len(),
            poc = result.poc,
            vah = result.vah,
            val = result.val,
            dominant = %result.dominant_tier.name,
            "📊 Range profile computed"
        );

        Ok(result)
    }
}
