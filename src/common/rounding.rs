//! Decimal rounding helpers.
//!
//! Bucket index math rounds the scaled offset to two decimals before taking
//! `floor`/`ceil`, which keeps prices sitting exactly on a bucket boundary from
//! drifting into the neighbouring bucket through floating point noise.

/// Round `value` to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_two_decimals() {
        assert_eq!(round_to(1.234, 2), 1.23);
        assert_eq!(round_to(1.236, 2), 1.24);
        assert_eq!(round_to(-1.236, 2), -1.24);
    }

    #[test]
    fn test_round_absorbs_boundary_noise() {
        let noisy: f64 = 2.9999999999999996;
        assert_eq!(noisy.floor(), 2.0);
        assert_eq!(round_to(noisy, 2).floor(), 3.0);
    }

    #[test]
    fn test_round_ties_to_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
    }
}
