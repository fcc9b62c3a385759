//! Dominant tier classification.
//!
//! `[VAL, VAH]`, taken at the reported one-decimal precision, is cut into
//! three equal thirds. Inner boundaries are rounded to two decimals and every
//! comparison is inclusive, so a bucket sitting exactly on a boundary counts
//! toward both neighbouring thirds. Claimed bucket prices are clamped into the
//! band first, so the outermost buckets always land in HIGH and LOW.

use crate::common::constants::{BUCKET_PRICE_DECIMALS, OUTPUT_PRICE_DECIMALS};
use crate::common::round_to;
use super::structs::{Tier, TierName, TierTieBreak, ValueArea};

/// HIGH, MID and LOW tiers of a value area, in that order
pub fn classify_tiers(value_area: &ValueArea) -> [Tier; 3] {
    let vah = round_to(value_area.high, OUTPUT_PRICE_DECIMALS);
    let val = round_to(value_area.low, OUTPUT_PRICE_DECIMALS);
    let third = (vah - val) / 3.0;
    let high_floor = round_to(vah - third, BUCKET_PRICE_DECIMALS);
    let mid_floor = round_to(val + third, BUCKET_PRICE_DECIMALS);

    let volume_between = |upper: f64, lower: f64| -> f64 {
        value_area
            .levels
            .iter()
            .filter(|level| {
                let price = round_to(level.price, BUCKET_PRICE_DECIMALS).clamp(val, vah);
                price <= upper && price >= lower
            })
            .map(|level| level.volume)
            .sum()
    };

    [
        Tier {
            name: TierName::High,
            volume: volume_between(vah, high_floor),
            upper_bound: vah,
            lower_bound: high_floor,
        },
        Tier {
            name: TierName::Mid,
            volume: volume_between(high_floor, mid_floor),
            upper_bound: high_floor,
            lower_bound: mid_floor,
        },
        Tier {
            name: TierName::Low,
            volume: volume_between(mid_floor, val),
            upper_bound: mid_floor,
            lower_bound: val,
        },
    ]
}

/// Tier holding the most volume, ties settled by `tie_break`
pub fn dominant_tier(tiers: &[Tier; 3], tie_break: TierTieBreak, poc: f64) -> Tier {
    let mut best = tiers[0];
    for tier in &tiers[1..] {
        let replace = if tier.volume > best.volume {
            true
        } else if tier.volume == best.volume {
            match tie_break {
                TierTieBreak::PreferHigher => false,
                TierTieBreak::NearestPoc => {
                    (tier.midpoint() - poc).abs() < (best.midpoint() - poc).abs()
                }
            }
        } else {
            false
        };

        if replace {
            best = *tier;
        }
    }
    best
}
