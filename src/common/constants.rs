/// Volume profile and range resolution constants

// Histogram resolution
pub const DEFAULT_BUCKET_COUNT: usize = 240;
pub const MIN_BUCKET_COUNT: usize = 3;
pub const MAX_BUCKET_COUNT: usize = 100_000;

// Value area
pub const DEFAULT_VALUE_AREA_PERCENTAGE: f64 = 70.0;

// Rounding applied to bucket index math and to reported prices
pub const INDEX_ROUNDING_DECIMALS: i32 = 2;
pub const BUCKET_PRICE_DECIMALS: i32 = 2;
pub const OUTPUT_PRICE_DECIMALS: i32 = 1;

// Range resolution
pub const DEFAULT_MAX_CANDLES: i64 = 5000;
pub const RANGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Time constants
pub const MILLISECONDS_PER_SECOND: i64 = 1000;
pub const SECONDS_PER_MINUTE: i64 = 60;
pub const MILLISECONDS_PER_MINUTE: i64 = MILLISECONDS_PER_SECOND * SECONDS_PER_MINUTE;

// Log file prefix used by the rolling appender and cleanup
pub const LOG_FILE_PREFIX: &str = "volume_profiler";
