//! Bit-level IEEE-754 single-precision routines.
//!
//! Every operation here stays in `f32` arithmetic; intermediate results are
//! never widened to `f64`, so results are identical on every target.
//!
//! The exponential uses the classic single-precision scheme:
//!
//! ```text
//! x = k*ln2 + r,  |r| <= ln2/2      (r carried as hi - lo)
//! e^r ~ 1 - ((lo - r*c/(2-c)) - hi) (minimax rational in r^2)
//! e^x = ldexp(e^r, k)              (exponent field written directly)
//! ```

const SIGN_MASK: u32 = 1 << 31;
const EXP_MASK: u32 = 0xff;
const EXP_SHIFT: u32 = 23;
const EXP_BIAS: i32 = 127;
const POS_INF_BITS: u32 = 0x7f80_0000;
const NEG_INF_BITS: u32 = 0xff80_0000;

/// ln2 split for exact `k * LN2_HI` products.
pub(crate) const LN2_HI: f32 = f32::from_bits(0x3f31_7180);
pub(crate) const LN2_LO: f32 = f32::from_bits(0x3717_f7d1);
pub(crate) const LOG2E: f32 = f32::from_bits(0x3fb8_aa3b);

/// Inputs above this overflow to `+inf` without range reduction.
///
/// The cutoff sits well past `ln(f32::MAX)`; between the two, [`ldexp`]
/// decides whether the scaled result is still finite.
pub const EXP_OVERFLOW: f32 = 7.097_827e2;
/// Inputs below this underflow to `0` without range reduction.
///
/// As with [`EXP_OVERFLOW`], the subnormal boundary is left to [`ldexp`].
pub const EXP_UNDERFLOW: f32 = -7.451_332e2;
/// Half-width of the band where `exp(x) = 1 + x` (2^-28).
pub const EXP_NEAR_ZERO: f32 = f32::from_bits(0x3180_0000);

const P1: f32 = f32::from_bits(0x3e2a_aaab);
const P2: f32 = f32::from_bits(0xbb36_0b61);
const P3: f32 = f32::from_bits(0x388a_b355);
const P4: f32 = f32::from_bits(0xb5dd_ea0e);
const P5: f32 = f32::from_bits(0x3331_bb4c);

// ============================================================================
// Classification
// ============================================================================

/// NaN test; only NaN compares unequal to itself.
#[inline]
#[allow(clippy::eq_op)]
pub fn is_nan(x: f32) -> bool {
    x != x
}

/// True for negative values, `-0.0`, and NaNs with the sign bit set.
#[inline]
pub fn signbit(x: f32) -> bool {
    x.to_bits() & SIGN_MASK != 0
}

/// Infinity test.
///
/// `sign > 0` matches `+inf` only, `sign < 0` matches `-inf` only, and
/// `sign == 0` matches either.
#[inline]
pub fn is_inf(x: f32, sign: i32) -> bool {
    (sign >= 0 && x > f32::MAX) || (sign <= 0 && x < -f32::MAX)
}

/// Signed infinity: `+inf` for `sign >= 0`, `-inf` otherwise.
#[inline]
pub fn inf(sign: i32) -> f32 {
    if sign >= 0 {
        f32::from_bits(POS_INF_BITS)
    } else {
        f32::from_bits(NEG_INF_BITS)
    }
}

/// Magnitude of `x` with the sign of `y`.
#[inline]
pub fn copysign(x: f32, y: f32) -> f32 {
    f32::from_bits((x.to_bits() & !SIGN_MASK) | (y.to_bits() & SIGN_MASK))
}

/// Absolute value by clearing the sign bit.
#[inline]
pub fn abs(x: f32) -> f32 {
    f32::from_bits(x.to_bits() & !SIGN_MASK)
}

/// Larger of two values.
///
/// `+inf` wins over everything including NaN; otherwise NaN propagates.
/// `max(-0.0, 0.0)` is `0.0`.
pub fn max(x: f32, y: f32) -> f32 {
    if is_inf(x, 1) || is_inf(y, 1) {
        return inf(1);
    }
    if is_nan(x) || is_nan(y) {
        return f32::NAN;
    }
    if x == 0.0 && x == y {
        return if signbit(x) { y } else { x };
    }
    if x > y { x } else { y }
}

// ============================================================================
// ldexp
// ============================================================================

/// Split a subnormal into a normal mantissa and a compensating exponent.
fn normalize(x: f32) -> (f32, i32) {
    if abs(x) < f32::MIN_POSITIVE {
        (x * (1u32 << EXP_SHIFT) as f32, -(EXP_SHIFT as i32))
    } else {
        (x, 0)
    }
}

/// Compute `frac * 2^exp` by rewriting the exponent field.
///
/// Results below the smallest subnormal become a signed zero and results
/// above `f32::MAX` become a signed infinity. Subnormal results are produced
/// by writing a normal exponent and scaling down by `2^-23`, so they round
/// exactly once.
pub fn ldexp(frac: f32, exp: i32) -> f32 {
    if frac == 0.0 || is_inf(frac, 0) || is_nan(frac) {
        return frac;
    }

    let (frac, e) = normalize(frac);
    let mut bits = frac.to_bits();
    let mut exp = exp
        .saturating_add(e)
        .saturating_add(((bits >> EXP_SHIFT) & EXP_MASK) as i32 - EXP_BIAS);

    if exp < -149 {
        return copysign(0.0, frac);
    }
    if exp > 127 {
        return if frac < 0.0 { inf(-1) } else { inf(1) };
    }

    let mut scale = 1.0f32;
    if exp < -(EXP_BIAS - 1) {
        exp += EXP_SHIFT as i32;
        scale = 1.0 / (1u32 << EXP_SHIFT) as f32;
    }
    bits &= !(EXP_MASK << EXP_SHIFT);
    bits |= ((exp + EXP_BIAS) as u32) << EXP_SHIFT;
    scale * f32::from_bits(bits)
}

// ============================================================================
// exp
// ============================================================================

/// Results for inputs that skip range reduction.
///
/// Shared by every exponential backend so they agree on special cases.
#[inline]
pub(crate) fn exp_special_case(x: f32) -> Option<f32> {
    if is_nan(x) || is_inf(x, 1) {
        Some(x)
    } else if is_inf(x, -1) {
        Some(0.0)
    } else if x > EXP_OVERFLOW {
        Some(inf(1))
    } else if x < EXP_UNDERFLOW {
        Some(0.0)
    } else if -EXP_NEAR_ZERO < x && x < EXP_NEAR_ZERO {
        Some(1.0 + x)
    } else {
        None
    }
}

/// Nearest integer to `x / ln2`, rounding half away from zero.
#[inline]
pub(crate) fn reduction_multiple(x: f32) -> i32 {
    if x < 0.0 {
        (LOG2E * x - 0.5) as i32
    } else {
        (LOG2E * x + 0.5) as i32
    }
}

/// Single-precision `e^x`.
///
/// Special cases: NaN and `+inf` are returned unchanged, `-inf` gives `0`,
/// inputs above [`EXP_OVERFLOW`] give `+inf`, inputs below
/// [`EXP_UNDERFLOW`] give `0`, and inputs within [`EXP_NEAR_ZERO`] of zero
/// give `1 + x`.
pub fn exp(x: f32) -> f32 {
    if let Some(y) = exp_special_case(x) {
        return y;
    }

    let k = reduction_multiple(x);
    let hi = x - k as f32 * LN2_HI;
    let lo = k as f32 * LN2_LO;
    exp_reduced(hi, lo, k)
}

/// `e^r * 2^k` where `r = hi - lo` and `|r| <= ln2/2`.
fn exp_reduced(hi: f32, lo: f32, k: i32) -> f32 {
    let r = hi - lo;
    let t = r * r;
    let c = r - t * (P1 + t * (P2 + t * (P3 + t * (P4 + t * P5))));
    let y = 1.0 - ((lo - (r * c) / (2.0 - c)) - hi);
    ldexp(y, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn classification() {
        assert!(is_nan(f32::NAN));
        assert!(!is_nan(f32::INFINITY));
        assert!(signbit(-0.0));
        assert!(!signbit(0.0));
        assert!(is_inf(f32::INFINITY, 1));
        assert!(!is_inf(f32::INFINITY, -1));
        assert!(is_inf(f32::NEG_INFINITY, 0));
        assert!(!is_inf(f32::MAX, 0));
        assert_eq!(inf(1), f32::INFINITY);
        assert_eq!(inf(-1), f32::NEG_INFINITY);
    }

    #[test]
    fn copysign_and_abs() {
        assert_eq!(copysign(3.0, -1.0), -3.0);
        assert_eq!(copysign(-3.0, 1.0), 3.0);
        assert!(signbit(copysign(0.0, -2.0)));
        assert_eq!(abs(-0.0).to_bits(), 0);
        assert_eq!(abs(-7.5), 7.5);
    }

    #[test]
    fn max_semantics() {
        assert_eq!(max(1.0, 2.0), 2.0);
        assert_eq!(max(f32::NAN, f32::INFINITY), f32::INFINITY);
        assert!(max(f32::NAN, 1.0).is_nan());
        assert!(!signbit(max(-0.0, 0.0)));
        assert!(!signbit(max(0.0, -0.0)));
    }

    #[test]
    fn ldexp_normal_range() {
        assert_eq!(ldexp(1.0, 10), 1024.0);
        assert_eq!(ldexp(1.5, -1), 0.75);
        assert_eq!(ldexp(-3.0, 2), -12.0);
        assert_eq!(ldexp(1.0, 127), f32::from_bits(0x7f00_0000));
    }

    #[test]
    fn ldexp_overflow_and_underflow() {
        assert_eq!(ldexp(1.0, 128), f32::INFINITY);
        assert_eq!(ldexp(-1.0, 200), f32::NEG_INFINITY);
        assert_eq!(ldexp(1.0, -150), 0.0);
        assert!(signbit(ldexp(-1.0, -150)));
    }

    #[test]
    fn ldexp_subnormal_range() {
        // Smallest positive subnormal.
        assert_eq!(ldexp(1.0, -149).to_bits(), 1);
        assert_eq!(ldexp(1.0, -127).to_bits(), 0x0040_0000);
        // Subnormal input renormalizes before scaling.
        assert_eq!(ldexp(f32::from_bits(1), 149), 1.0);
    }

    #[test]
    fn ldexp_passthrough() {
        assert!(signbit(ldexp(-0.0, 5)));
        assert_eq!(ldexp(f32::INFINITY, -5), f32::INFINITY);
        assert!(ldexp(f32::NAN, 3).is_nan());
    }

    #[test]
    fn exp_special_cases() {
        assert!(exp(f32::NAN).is_nan());
        assert_eq!(exp(f32::INFINITY), f32::INFINITY);
        assert_eq!(exp(f32::NEG_INFINITY), 0.0);
        assert_eq!(exp(89.0), f32::INFINITY);
        assert_eq!(exp(-104.0), 0.0);
        assert_eq!(exp(0.0), 1.0);
        assert_eq!(exp(1e-9), 1.0 + 1e-9);
    }

    #[test]
    fn exp_matches_known_values() {
        assert_eq!(exp(1.0), std::f32::consts::E);
        assert_relative_eq!(exp(-1.0), 0.367_879_44, max_relative = 1e-6);
        assert_relative_eq!(exp(10.0), 22_026.465, max_relative = 1e-6);
        assert_relative_eq!(exp(-20.0), 2.061_153_6e-9, max_relative = 1e-6);
        assert_relative_eq!(exp(88.0), 1.651_636_3e38, max_relative = 1e-6);
    }

    #[test]
    fn exp_finite_just_below_f32_max() {
        // ln(f32::MAX) ~ 88.72284; the scaled result must still be finite.
        for x in [88.722_5f32, 88.722_8] {
            let k = reduction_multiple(x);
            let reduced = exp_reduced(x - k as f32 * LN2_HI, k as f32 * LN2_LO, k);
            assert_eq!(k, 128);
            assert!(reduced.is_finite());
            assert_eq!(exp(x).to_bits(), reduced.to_bits());
        }
        assert_relative_eq!(exp(88.722_5), 3.401_682_4e38, max_relative = 1e-6);
        assert_eq!(exp(88.723), f32::INFINITY);
        assert_eq!(exp(1000.0), f32::INFINITY);
    }

    #[test]
    fn exp_reaches_subnormals() {
        let y = exp(-100.0);
        assert!(y > 0.0 && y < f32::MIN_POSITIVE);
        assert_relative_eq!(y, 3.720_076e-44, max_relative = 1e-1);
        assert_eq!(exp(-110.0), 0.0);
        assert_eq!(exp(-1000.0), 0.0);
    }

    #[test]
    fn exp_is_monotonic_on_a_grid() {
        let mut prev = 0.0f32;
        for i in -1000..=880 {
            let y = exp(i as f32 * 0.1);
            assert!(y >= prev, "exp not monotonic at {}", i);
            prev = y;
        }
    }
}
