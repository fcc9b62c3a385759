/// Range Resolution Module
///
/// Turns an (asset, interval, start, end) request into the ordered candle
/// series the volume profiler consumes: interval escalation, alignment to
/// interval boundaries and slicing out of a `CandleSource`.
pub mod errors;
pub mod resolver;
pub mod source;
pub mod structs;

pub use errors::RangeError;
pub use resolver::{parse_range_timestamp, RangeRequest, RangeResolver, ResolvedRange};
pub use source::{CandleSource, CsvCandleSource, InMemoryCandleSource};
pub use structs::{Candle, Interval, TimestampMS};
