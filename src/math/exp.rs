//! Exponential strategies for the objective transforms.

use serde::{Deserialize, Serialize};

use super::float32::{self, LN2_HI, LN2_LO, exp_special_case, ldexp, reduction_multiple};

/// Which single-precision exponential the transforms use.
///
/// Both backends agree exactly on special cases (NaN, infinities, overflow,
/// underflow, the near-zero band). They differ only in how `e^r` is
/// approximated on the reduced interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpBackend {
    /// Rational approximation with a split remainder; reproduces the
    /// reference predictor bit for bit.
    #[default]
    Reference,
    /// Degree-6 Taylor polynomial with a direct power-of-two scale.
    /// Within a few ulps of [`ExpBackend::Reference`].
    Fast,
}

impl ExpBackend {
    /// Evaluate `e^x` with this backend.
    #[inline]
    pub fn exp(self, x: f32) -> f32 {
        match self {
            ExpBackend::Reference => float32::exp(x),
            ExpBackend::Fast => fast_exp(x),
        }
    }
}

const C2: f32 = 1.0 / 2.0;
const C3: f32 = 1.0 / 6.0;
const C4: f32 = 1.0 / 24.0;
const C5: f32 = 1.0 / 120.0;
const C6: f32 = 1.0 / 720.0;

fn fast_exp(x: f32) -> f32 {
    if let Some(y) = exp_special_case(x) {
        return y;
    }

    let k = reduction_multiple(x);
    let r = (x - k as f32 * LN2_HI) - k as f32 * LN2_LO;
    let p = ((((C6 * r + C5) * r + C4) * r + C3) * r + C2) * r;
    let p = (p + 1.0) * r + 1.0;

    if (-126..=127).contains(&k) {
        p * f32::from_bits(((k + 127) as u32) << 23)
    } else {
        ldexp(p, k)
    }
}
