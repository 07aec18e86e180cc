//! Output transformation for inference.
//!
//! The [`OutputTransform`] enum defines how raw model outputs (margins)
//! are converted to final predictions.
//!
//! # Variants
//!
//! - [`Identity`](OutputTransform::Identity): No transformation (regression, ranking, raw logits)
//! - [`Sigmoid`](OutputTransform::Sigmoid): Logistic sigmoid for binary classification
//! - [`Softmax`](OutputTransform::Softmax): Class probabilities for multiclass classification
//! - [`SoftmaxArgmax`](OutputTransform::SoftmaxArgmax): Winning class index for multiclass classification
//!
//! Every exponential goes through an [`ExpBackend`], never through `f32::exp`.

use serde::{Deserialize, Serialize};

use super::PredictError;
use crate::math::{ExpBackend, float32};

/// Inference-time output transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTransform {
    /// No transformation; output = margin.
    #[default]
    Identity,

    /// Logistic sigmoid: output = 1 / (1 + exp(-margin)).
    Sigmoid,

    /// Softmax: output_i = exp(margin_i - max) / sum(exp(margin_j - max)).
    Softmax,

    /// Index of the largest margin, as a one-element vector.
    ///
    /// NaN margins never win: a NaN in slot 0 does not make class 0 the
    /// answer, and only an all-NaN vector falls back to class 0.
    SoftmaxArgmax,
}

impl OutputTransform {
    pub fn name(self) -> &'static str {
        match self {
            OutputTransform::Identity => "identity",
            OutputTransform::Sigmoid => "sigmoid",
            OutputTransform::Softmax => "softmax",
            OutputTransform::SoftmaxArgmax => "softmax_argmax",
        }
    }

    /// Transform a single margin.
    ///
    /// The softmax variants need the whole vector and fail with
    /// [`PredictError::SingleValueUnsupported`].
    pub fn transform_single(self, margin: f32, exp: ExpBackend) -> Result<f32, PredictError> {
        match self {
            OutputTransform::Identity => Ok(margin),
            OutputTransform::Sigmoid => Ok(sigmoid(margin, exp)),
            OutputTransform::Softmax | OutputTransform::SoftmaxArgmax => {
                Err(PredictError::SingleValueUnsupported {
                    transform: self.name(),
                })
            }
        }
    }

    /// Transform a vector of per-group margins.
    ///
    /// [`SoftmaxArgmax`](OutputTransform::SoftmaxArgmax) shrinks the vector
    /// to one element; an empty input stays empty.
    pub fn transform(self, mut margins: Vec<f32>, exp: ExpBackend) -> Vec<f32> {
        match self {
            OutputTransform::Identity => {}
            OutputTransform::Sigmoid => {
                for x in margins.iter_mut() {
                    *x = sigmoid(*x, exp);
                }
            }
            OutputTransform::Softmax => softmax_inplace(&mut margins, exp),
            OutputTransform::SoftmaxArgmax => {
                margins = match argmax(&margins) {
                    Some(idx) => vec![idx as f32],
                    None if margins.is_empty() => Vec::new(),
                    None => vec![0.0],
                };
            }
        }
        margins
    }
}

/// Logistic sigmoid in float32.
///
/// No clamping: margins below about `-88.72` overflow the exponential and
/// give exactly `0`, and margins above about `17` round to exactly `1`.
#[inline]
pub fn sigmoid(x: f32, exp: ExpBackend) -> f32 {
    1.0 / (1.0 + exp.exp(-x))
}

/// Softmax in-place over a slice.
/// Subtracts max before exponentiating to avoid overflow.
///
/// A NaN or `+inf` margin makes the sum NaN, and then every entry is NaN.
pub fn softmax_inplace(row: &mut [f32], exp: ExpBackend) {
    if row.is_empty() {
        return;
    }

    let max = row.iter().copied().fold(row[0], float32::max);

    let mut sum = 0.0f32;
    for x in row.iter_mut() {
        *x = exp.exp(*x - max);
        sum += *x;
    }

    for x in row.iter_mut() {
        *x /= sum;
    }
}

/// Index of the first strictly-largest value, ignoring NaN.
///
/// `None` if the slice is empty or all NaN.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, max)) if v <= max => {}
            _ => best = Some((idx, v)),
        }
    }
    best.map(|(idx, _)| idx)
}
