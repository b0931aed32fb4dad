//! Fixed-point weight helpers.
//!
//! Persisted weights are quantized to **centi-kilograms** (ckg, 1 ckg =
//! 0.01 kg) so the two-decimal rounding rule lives in one place and
//! comparisons at the persistence boundary are exact integers.

/// Quantize a kilogram value to integer centi-kilograms, rounding to
/// nearest and clamping to the i32 range. Non-finite values (NaN/±Inf)
/// map to 0.
#[inline]
pub fn quantize_ckg(x_kg: f64) -> i32 {
    if !x_kg.is_finite() {
        return 0;
    }
    let scaled = (x_kg * 100.0).round();
    if scaled >= f64::from(i32::MAX) {
        i32::MAX
    } else if scaled <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        scaled as i32
    }
}

/// Convert centi-kilograms back to kilograms. Exact for all i32 inputs.
#[inline]
pub fn ckg_to_kg(ckg: i32) -> f64 {
    f64::from(ckg) / 100.0
}

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Poll period in milliseconds for a given rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures the result is at least 1 millisecond.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    (MILLIS_PER_SEC / u64::from(hz.max(1))).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(quantize_ckg(4.567), 457);
        assert_eq!(ckg_to_kg(457), 4.57);
        assert_eq!(quantize_ckg(4.564), 456);
        assert_eq!(quantize_ckg(6.0), 600);
    }

    #[test]
    fn sub_centikg_noise_quantizes_to_zero() {
        assert_eq!(quantize_ckg(0.004), 0);
        assert_eq!(quantize_ckg(-0.004), 0);
        assert_eq!(quantize_ckg(0.0), 0);
    }

    #[test]
    fn non_finite_maps_to_zero() {
        assert_eq!(quantize_ckg(f64::NAN), 0);
        assert_eq!(quantize_ckg(f64::INFINITY), 0);
        assert_eq!(quantize_ckg(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn extremes_clamp() {
        assert_eq!(quantize_ckg(1e12), i32::MAX);
        assert_eq!(quantize_ckg(-1e12), i32::MIN);
    }

    #[test]
    fn period_clamps_rate() {
        assert_eq!(period_ms(20), 50);
        assert_eq!(period_ms(0), 1_000);
        assert_eq!(period_ms(10_000), 1);
    }
}
