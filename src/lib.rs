pub mod common;
pub mod config;
pub mod logging;
pub mod range;
pub mod volume_profile;

pub use config::{AppConfig, ConfigError, RangeConfig};
pub use range::{Candle, CandleSource, CsvCandleSource, InMemoryCandleSource, Interval, RangeError, RangeRequest, RangeResolver};
pub use volume_profile::{ProfileResult, VolumeProfileCalculator, VolumeProfileConfig, VolumeProfileError};
