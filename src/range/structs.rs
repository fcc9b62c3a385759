use serde::{Deserialize, Serialize};

use crate::common::constants::MILLISECONDS_PER_MINUTE;
use super::errors::RangeError;

pub type TimestampMS = i64;

/// OHLCV candle as handed to the profiler.
///
/// Only `high`, `low` and `volume` drive the histogram. `open_time` is used by
/// the range resolver for slicing and alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: TimestampMS,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(open_time: TimestampMS, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Candle carrying only the fields the histogram reads; open and close sit at the range midpoint.
    pub fn from_range(open_time: TimestampMS, high: f64, low: f64, volume: f64) -> Self {
        let mid = (high + low) / 2.0;
        Self::new(open_time, mid, high, low, mid, volume)
    }
}

/// Candle intervals available to the range resolver, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1M")]
    OneMinute,
    #[serde(rename = "3M")]
    ThreeMinutes,
    #[serde(rename = "5M")]
    FiveMinutes,
    #[serde(rename = "15M")]
    FifteenMinutes,
    #[serde(rename = "60M")]
    SixtyMinutes,
}

impl Interval {
    /// Escalation ladder, finest to coarsest
    pub const LADDER: [Interval; 5] = [
        Interval::OneMinute,
        Interval::ThreeMinutes,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::SixtyMinutes,
    ];

    pub fn minutes(self) -> i64 {
        match self {
            Self::OneMinute => 1,
            Self::ThreeMinutes => 3,
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::SixtyMinutes => 60,
        }
    }

    pub fn duration_ms(self) -> i64 {
        self.minutes() * MILLISECONDS_PER_MINUTE
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1M",
            Self::ThreeMinutes => "3M",
            Self::FiveMinutes => "5M",
            Self::FifteenMinutes => "15M",
            Self::SixtyMinutes => "60M",
        }
    }

    /// Ladder entries from the finest interval up to and including `self`
    pub fn ladder_up_to(self) -> &'static [Interval] {
        let position = Self::LADDER
            .iter()
            .position(|interval| *interval == self)
            .unwrap_or(Self::LADDER.len() - 1);
        &Self::LADDER[..=position]
    }

    /// Floor a timestamp to this interval's boundary (UTC epoch based)
    pub fn align(self, timestamp: TimestampMS) -> TimestampMS {
        timestamp.div_euclid(self.duration_ms()) * self.duration_ms()
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Interval {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1M" => Ok(Self::OneMinute),
            "3M" => Ok(Self::ThreeMinutes),
            "5M" => Ok(Self::FiveMinutes),
            "15M" => Ok(Self::FifteenMinutes),
            "60M" | "1H" => Ok(Self::SixtyMinutes),
            _ => Err(RangeError::UnknownInterval(s.to_string())),
        }
    }
}
