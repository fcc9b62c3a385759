pub mod constants;
pub mod rounding;

pub use rounding::round_to;
