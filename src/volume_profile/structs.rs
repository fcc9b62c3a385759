use serde::{Deserialize, Serialize};

use crate::common::constants::{
    DEFAULT_BUCKET_COUNT, DEFAULT_VALUE_AREA_PERCENTAGE, MAX_BUCKET_COUNT, MIN_BUCKET_COUNT,
};

/// Volume profile configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeProfileConfig {
    /// Number of equal-height price buckets in the histogram (default: 240)
    pub bucket_count: usize,
    /// Share of total volume the value area must capture, in percent (default: 70)
    pub value_area_percentage: f64,
    /// Attach the raw bucket volumes (top to bottom) to the result
    pub include_heatmap: bool,
    pub volume_split_mode: VolumeSplitMode,
    pub tier_tie_break: TierTieBreak,
}

impl Default for VolumeProfileConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            value_area_percentage: DEFAULT_VALUE_AREA_PERCENTAGE,
            include_heatmap: false,
            volume_split_mode: VolumeSplitMode::default(),
            tier_tie_break: TierTieBreak::default(),
        }
    }
}

impl VolumeProfileConfig {
    /// Validate configuration for consistency and reasonable values
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_BUCKET_COUNT..=MAX_BUCKET_COUNT).contains(&self.bucket_count) {
            return Err(format!(
                "bucket_count must be between {} and {}, got {}",
                MIN_BUCKET_COUNT, MAX_BUCKET_COUNT, self.bucket_count
            ));
        }

        if !self.value_area_percentage.is_finite()
            || self.value_area_percentage <= 0.0
            || self.value_area_percentage > 100.0
        {
            return Err(format!(
                "value_area_percentage must be in (0, 100], got {}",
                self.value_area_percentage
            ));
        }

        Ok(())
    }

    /// Value area share as a fraction of total volume
    pub fn value_area_fraction(&self) -> f64 {
        self.value_area_percentage / 100.0
    }
}

/// How a candle spanning several buckets splits its volume
///
/// Both modes give a candle touching a single bucket its full volume and give
/// the partially overlapped edge buckets less than the interior buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VolumeSplitMode {
    /// Split in proportion to the overlapped share of each bucket
    ///
    /// Interior buckets weigh 1.0, edge buckets weigh the fraction of their
    /// height the candle actually covers. The candle volume is conserved.
    #[default]
    OverlapWeighted,

    /// Even share `volume / k` per touched bucket, edges scaled down by their overlap
    ///
    /// The non-overlapped part of the edge shares is dropped, so the histogram
    /// total ends up below the input volume. Kept for compatibility with
    /// profiles produced by the legacy tooling.
    EdgeTruncated,
}

/// Rule for picking the dominant tier when several tiers hold the same volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TierTieBreak {
    /// HIGH beats MID beats LOW
    #[default]
    PreferHigher,
    /// The tied tier whose midpoint is closest to the POC, then HIGH > MID > LOW
    NearestPoc,
}

/// One third of the value area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TierName {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MID")]
    Mid,
    #[serde(rename = "LOW")]
    Low,
}

impl TierName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Mid => "MID",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for TierName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Volume captured by one third of the value area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub name: TierName,
    pub volume: f64,
    pub upper_bound: f64,
    pub lower_bound: f64,
}

impl Tier {
    pub fn midpoint(&self) -> f64 {
        (self.upper_bound + self.lower_bound) / 2.0
    }
}

/// Bucket claimed by the value area expansion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueAreaLevel {
    /// Bucket index, 0 is the highest price
    pub index: usize,
    /// Representative price: bucket midpoint for the POC, bucket top otherwise
    pub price: f64,
    pub volume: f64,
}

/// Buckets around the POC holding the target share of volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueArea {
    /// Claimed buckets ordered from the highest price down
    pub levels: Vec<ValueAreaLevel>,
    /// Highest representative price among claimed buckets
    pub high: f64,
    /// Lowest representative price among claimed buckets
    pub low: f64,
    /// Total volume within value area
    pub volume: f64,
    /// Volume added by the final expansion step (the POC volume if no step was taken)
    pub last_step_volume: f64,
    pub target_volume: f64,
    /// Percentage of total histogram volume in value area
    pub volume_percentage: f64,
    /// False only when both histogram boundaries were exhausted before the target
    pub target_reached: bool,
}

/// Final volume profile for one candle series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResult {
    /// Point of Control, rounded to 1 decimal
    pub poc: f64,
    /// Value Area High, rounded to 1 decimal
    pub vah: f64,
    /// Value Area Low, rounded to 1 decimal
    pub val: f64,
    pub dominant_tier: Tier,
    /// HIGH, MID and LOW in that order
    pub tiers: [Tier; 3],
    pub value_area_volume: f64,
    pub total_volume: f64,
    pub bucket_count: usize,
    pub price_step: f64,
    /// Raw bucket volumes, highest price first
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub heatmap: Option<Vec<f64>>,
}

impl ProfileResult {
    /// `(POC, VAH, VAL, (name, volume, upper, lower))`
    pub fn as_tuple(&self) -> (f64, f64, f64, (&'static str, f64, f64, f64)) {
        (
            self.poc,
            self.vah,
            self.val,
            (
                self.dominant_tier.name.as_str(),
                self.dominant_tier.volume,
                self.dominant_tier.upper_bound,
                self.dominant_tier.lower_bound,
            ),
        )
    }
}
