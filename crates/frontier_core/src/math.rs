//! Fixed-point math utilities for deterministic simulation.
//!
//! Fractional tunables (drain percentages, growth multipliers) are stored as
//! fixed-point so that every client computes identical troop amounts.
//! Floating-point operations can produce different results on different CPUs.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Build a fixed-point fraction from a whole-number percentage.
///
/// Rounds to the nearest representable value, matching what a decimal such
/// as `0.05` parses to in a config file.
#[must_use]
pub fn percent(value: i32) -> Fixed {
    let scaled = i128::from(value) << Fixed::FRAC_NBITS;
    let rounded = (scaled + 50 * scaled.signum()) / 100;
    Fixed::from_bits(i64::try_from(rounded).unwrap_or(i64::MAX))
}

/// Resolution at which fractions are read back as the decimal they came from.
pub const PARTS_PER_MILLION: u32 = 1_000_000;

/// Nearest whole parts-per-million value of a non-negative fraction.
///
/// Every config fraction is written with at most six decimal places, and the
/// fixed-point error is far below half a millionth, so this recovers the
/// decimal exactly.
#[must_use]
pub fn to_parts_per_million(fraction: Fixed) -> u64 {
    if fraction <= Fixed::ZERO {
        return 0;
    }
    let bits = i128::from(fraction.to_bits());
    let half = 1i128 << (Fixed::FRAC_NBITS - 1);
    let ppm = (bits * i128::from(PARTS_PER_MILLION) + half) >> Fixed::FRAC_NBITS;
    u64::try_from(ppm).unwrap_or(u64::MAX)
}

/// Multiply a non-negative integer by a fraction and round toward zero.
///
/// The fraction is first resolved to parts per million, so the floor is
/// taken against the decimal value rather than its binary approximation.
/// Saturates at `u32::MAX`.
#[must_use]
pub fn floor_mul(amount: u32, fraction: Fixed) -> u32 {
    let ppm = u128::from(to_parts_per_million(fraction));
    let product = u128::from(amount) * ppm / u128::from(PARTS_PER_MILLION);
    u32::try_from(product).unwrap_or(u32::MAX)
}

/// Serde support for fixed-point numbers written as decimals.
///
/// Config files are edited by hand, so fractions appear as `0.05` rather than
/// raw bits. Conversion from the parsed decimal happens once at load time.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(50), Fixed::from_num(0.5));
        assert_eq!(percent(0), Fixed::ZERO);
        assert_eq!(percent(-25), Fixed::from_num(-0.25));
    }

    #[test]
    fn test_percent_matches_decimal() {
        assert_eq!(percent(5), Fixed::from_num(0.05));
        assert_eq!(percent(10), Fixed::from_num(0.1));
        assert_eq!(percent(33), Fixed::from_num(0.33));
    }

    #[test]
    fn test_floor_mul_rounds_down() {
        assert_eq!(floor_mul(1000, percent(5)), 50);
        assert_eq!(floor_mul(99, percent(5)), 4);
        assert_eq!(floor_mul(0, percent(5)), 0);
    }

    #[test]
    fn test_floor_mul_non_positive_fraction() {
        assert_eq!(floor_mul(1000, Fixed::ZERO), 0);
        assert_eq!(floor_mul(1000, -percent(5)), 0);
    }

    #[test]
    fn test_floor_mul_does_not_overshoot_rounded_up_fractions() {
        // 0.33 is stored slightly above its decimal value
        assert!(percent(33).to_bits() * 100 > 33i64 << Fixed::FRAC_NBITS);
        assert_eq!(floor_mul(32_537_703, percent(33)), 10_737_441);
        assert_eq!(floor_mul(u32::MAX, percent(7)), 300_647_710);
    }

    #[test]
    fn test_parts_per_million() {
        assert_eq!(to_parts_per_million(percent(5)), 50_000);
        assert_eq!(to_parts_per_million(Fixed::from_num(0.123_456)), 123_456);
        assert_eq!(to_parts_per_million(-percent(5)), 0);
    }

    #[test]
    fn test_floor_mul_saturates() {
        assert_eq!(floor_mul(u32::MAX, Fixed::from_num(4)), u32::MAX);
    }
}
