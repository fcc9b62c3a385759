/// Volume Profile Module
///
/// Builds a fixed-resolution volume histogram from a candle series and derives
/// the Point of Control, the value area (VAH/VAL) and the dominant third of
/// that value area.
pub mod calculator;
pub mod errors;
pub mod histogram;
pub mod structs;
pub mod tiers;
pub mod validation;
pub mod value_area;

pub use calculator::VolumeProfileCalculator;
pub use errors::VolumeProfileError;
pub use histogram::VolumeHistogram;
pub use structs::{
    ProfileResult, Tier, TierName, TierTieBreak, ValueArea, ValueAreaLevel,
    VolumeProfileConfig, VolumeSplitMode,
};
pub use value_area::{expand_value_area, ExpansionState};
