use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolumeProfileError {
    #[error("Empty candle sequence: nothing to profile")]
    EmptyInput,
    #[error("Degenerate price range: every candle trades at {price}")]
    DegenerateRange { price: f64 },
    #[error("Invalid candle at index {index}: {field} = {value} ({reason})")]
    InvalidCandle {
        index: usize,
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("Total volume overflows at candle {index}: sum is no longer finite")]
    VolumeOverflow { index: usize },
    #[error("Invalid volume profile configuration: {0}")]
    InvalidConfig(String),
}
