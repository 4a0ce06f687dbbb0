//! Rounding used to build canonical (comparison) states.

/// Significant figures kept when values are canonicalized for structural comparison.
pub const HASH_SIGFIGS: u32 = 12;

/// Round `x` to `sigfigs` significant figures.
///
/// Zero (of either sign) maps to `+0.0`; NaN and infinities are returned unchanged.
pub fn round_sigfigs(x: f64, sigfigs: u32) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    if !x.is_finite() || sigfigs == 0 {
        return x;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let shift = sigfigs as i32 - 1 - magnitude;
    // 10^shift overflows for subnormal inputs; scale in two steps there.
    if shift > 300 {
        let half = shift / 2;
        let a = 10f64.powi(half);
        let b = 10f64.powi(shift - half);
        return ((x * a * b).round() / b) / a;
    }
    let factor = 10f64.powi(shift);
    let rounded = (x * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Round every element of `values` to [`HASH_SIGFIGS`] significant figures.
pub fn normalize(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values.into_iter().map(|v| round_sigfigs(v, HASH_SIGFIGS)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_basic() {
        assert_eq!(round_sigfigs(123.456, 3), 123.0);
        assert_eq!(round_sigfigs(0.012345, 2), 0.012);
        assert_eq!(round_sigfigs(-0.0, 12), 0.0);
        assert!(round_sigfigs(-0.0, 12).is_sign_positive());
        assert!(round_sigfigs(f64::NAN, 12).is_nan());
        assert_eq!(round_sigfigs(f64::INFINITY, 12), f64::INFINITY);
    }

    #[test]
    fn test_absorbs_float_noise() {
        let a = 0.1 + 0.2;
        let b = 0.3;
        assert_ne!(a, b);
        assert_eq!(round_sigfigs(a, HASH_SIGFIGS), round_sigfigs(b, HASH_SIGFIGS));
    }

    proptest! {
        #[test]
        fn prop_round_is_idempotent(x in -1e12f64..1e12) {
            let once = round_sigfigs(x, HASH_SIGFIGS);
            let twice = round_sigfigs(once, HASH_SIGFIGS);
            prop_assert!((once - twice).abs() <= once.abs() * 1e-15);
        }
    }
}
