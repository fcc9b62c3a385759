//! Value area expansion around the Point of Control.
//!
//! Starting from the POC bucket, the area grows two buckets at a time: the
//! next pair above is compared with the next pair below and the heavier pair
//! is claimed (ties go up). Once one side runs into its histogram boundary
//! every further step is forced onto the other side. Expansion stops as soon
//! as the claimed volume reaches the target share.
//!
//! This is a greedy local rule. It does not search for the narrowest band that
//! holds the target volume.

use tracing::{debug, warn};

use crate::common::constants::BUCKET_PRICE_DECIMALS;
use crate::common::round_to;
use super::histogram::VolumeHistogram;
use super::structs::{ValueArea, ValueAreaLevel};

/// Which sides of the POC can still grow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    BothOpen,
    UpOnly,
    DownOnly,
    Exhausted,
}

impl ExpansionState {
    fn from_pairs(up: Option<BucketPair>, down: Option<BucketPair>) -> Self {
        match (up.is_some(), down.is_some()) {
            (true, true) => Self::BothOpen,
            (true, false) => Self::UpOnly,
            (false, true) => Self::DownOnly,
            (false, false) => Self::Exhausted,
        }
    }
}

/// Next pair of buckets on one side; `first == second` once the side is down to one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BucketPair {
    first: usize,
    second: usize,
}

impl BucketPair {
    fn volume(&self, histogram: &VolumeHistogram) -> f64 {
        if self.first == self.second {
            histogram.volume(self.first)
        } else {
            histogram.volume(self.first) + histogram.volume(self.second)
        }
    }
}

struct ValueAreaExpander<'a> {
    histogram: &'a VolumeHistogram,
    poc: usize,
    up_steps: usize,
    down_steps: usize,
}

impl<'a> ValueAreaExpander<'a> {
    fn new(histogram: &'a VolumeHistogram, poc: usize) -> Self {
        Self {
            histogram,
            poc,
            up_steps: 0,
            down_steps: 0,
        }
    }

    /// Next unclaimed pair above the POC; bucket 0 closes the side
    fn up_pair(&self) -> Option<BucketPair> {
        let poc = self.poc as isize;
        let step = self.up_steps as isize;
        let first = poc - (2 * step + 1);
        let second = poc - (2 * step + 2);

        if first <= 0 {
            return None;
        }
        let second = if second <= 0 { first } else { second };
        Some(BucketPair {
            first: first as usize,
            second: second as usize,
        })
    }

    /// Next unclaimed pair below the POC; the last bucket closes the side
    fn down_pair(&self) -> Option<BucketPair> {
        let last = self.histogram.bucket_count() as isize - 1;
        let poc = self.poc as isize;
        let step = self.down_steps as isize;
        let first = poc + (2 * step + 1);
        let second = poc + (2 * step + 2);

        if first >= last {
            return None;
        }
        let second = if second >= last { first } else { second };
        Some(BucketPair {
            first: first as usize,
            second: second as usize,
        })
    }

    fn level(&self, index: usize) -> ValueAreaLevel {
        ValueAreaLevel {
            index,
            price: round_to(self.histogram.price_top(index), BUCKET_PRICE_DECIMALS),
            volume: self.histogram.volume(index),
        }
    }

    fn claim(&self, pair: BucketPair, levels: &mut Vec<ValueAreaLevel>) -> f64 {
        levels.push(self.level(pair.first));
        if pair.second != pair.first {
            levels.push(self.level(pair.second));
        }
        pair.volume(self.histogram)
    }

    fn expand(mut self, fraction: f64) -> ValueArea {
        let histogram = self.histogram;
        let total_volume = histogram.total_volume();
        let target_volume = total_volume * fraction;

        let mut levels = vec![ValueAreaLevel {
            index: self.poc,
            price: histogram.midpoint(self.poc),
            volume: histogram.volume(self.poc),
        }];
        let mut accumulated = histogram.volume(self.poc);
        let mut last_step_volume = accumulated;
        let mut state = ExpansionState::BothOpen;

        for _ in 0..histogram.bucket_count() {
            if accumulated >= target_volume {
                break;
            }

            let up = self.up_pair();
            let down = self.down_pair();
            state = ExpansionState::from_pairs(up, down);

            match (state, up, down) {
                (ExpansionState::BothOpen, Some(up), Some(down)) => {
                    if up.volume(histogram) >= down.volume(histogram) {
                        last_step_volume = self.claim(up, &mut levels);
                        self.up_steps += 1;
                    } else {
                        last_step_volume = self.claim(down, &mut levels);
                        self.down_steps += 1;
                    }
                }
                (ExpansionState::UpOnly, Some(up), _) => {
                    last_step_volume = self.claim(up, &mut levels);
                    self.up_steps += 1;
                }
                (ExpansionState::DownOnly, _, Some(down)) => {
                    last_step_volume = self.claim(down, &mut levels);
                    self.down_steps += 1;
                }
                _ => break,
            }
            accumulated += last_step_volume;
        }

        let target_reached = accumulated >= target_volume;
        if !target_reached {
            warn!(
                accumulated,
                target_volume,
                ?state,
                "Value area expansion ran out of buckets before reaching target"
            );
        }

        levels.sort_by_key(|level| level.index);
        let high = levels.iter().map(|level| level.price).fold(f64::NEG_INFINITY, f64::max);
        let low = levels.iter().map(|level| level.price).fold(f64::INFINITY, f64::min);

        debug!(
            poc = self.poc,
            up_steps = self.up_steps,
            down_steps = self.down_steps,
            claimed = levels.len(),
            "Value area expanded"
        );

        ValueArea {
            levels,
            high,
            low,
            volume: accumulated,
            last_step_volume,
            target_volume,
            volume_percentage: if total_volume > 0.0 {
                accumulated / total_volume * 100.0
            } else {
                0.0
            },
            target_reached,
        }
    }
}

/// Expand the value area from the POC until `fraction` of total volume is claimed
pub fn expand_value_area(histogram: &VolumeHistogram, fraction: f64) -> ValueArea {
    ValueAreaExpander::new(histogram, histogram.poc_index()).expand(fraction)
}
