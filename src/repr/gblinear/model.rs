//! Linear model data structure.

use std::io::Read;

use tracing::debug;

use crate::data::FeatureVector;
use crate::io::{ModelReader, ReadError};
use crate::model::PredictError;

/// Linear parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearParam {
    pub num_feature: usize,
    pub num_output_group: usize,
}

impl LinearParam {
    const RESERVED: usize = 32;

    fn read<R: Read>(reader: &mut ModelReader<R>) -> Result<Self, ReadError> {
        let num_feature = reader.read_count("num_feature")?;
        let num_output_group = reader.read_count("num_output_group")?;
        reader.read_i32_array(Self::RESERVED)?;
        let _ = reader.read_i32()?;
        Ok(Self {
            num_feature,
            num_output_group,
        })
    }

    fn n_weights(&self) -> Result<usize, ReadError> {
        self.num_feature
            .checked_add(1)
            .and_then(|rows| rows.checked_mul(self.num_output_group))
            .ok_or(ReadError::Overflow {
                what: "weight count",
                value: i64::try_from(self.num_feature).unwrap_or(i64::MAX),
            })
    }
}

/// Linear booster model (weights + bias).
///
/// Stores `(num_features + 1) × num_groups` weights, feature-major with the
/// bias in the last row.
#[derive(Debug, Clone)]
pub struct LinearModel {
    /// Flat weight array: (num_features + 1) × num_groups
    weights: Box<[f32]>,

    num_features: usize,

    num_groups: usize,
}

impl LinearModel {
    /// Create a linear model from weights.
    ///
    /// # Panics
    ///
    /// Panics if weights length doesn't match `(num_features + 1) * num_groups`.
    pub fn new(weights: Box<[f32]>, num_features: usize, num_groups: usize) -> Self {
        let expected_len = (num_features + 1) * num_groups;
        assert_eq!(
            weights.len(),
            expected_len,
            "weights length {} doesn't match (num_features + 1) * num_groups = {}",
            weights.len(),
            expected_len
        );

        Self {
            weights,
            num_features,
            num_groups,
        }
    }

    /// Decode the linear section of a model stream.
    pub fn read<R: Read>(reader: &mut ModelReader<R>) -> Result<Self, ReadError> {
        let param = LinearParam::read(reader)?;
        let weights = reader.read_f32_array(param.n_weights()?)?;
        debug!(
            features = param.num_feature,
            groups = param.num_output_group,
            weights = weights.len(),
            "loaded linear model"
        );
        Ok(Self {
            weights: weights.into_boxed_slice(),
            num_features: param.num_feature,
            num_groups: param.num_output_group,
        })
    }

    #[inline]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    #[inline]
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Weight for a feature and group.
    #[inline]
    pub fn weight(&self, feature: usize, group: usize) -> f32 {
        debug_assert!(feature < self.num_features, "feature index out of bounds");
        debug_assert!(group < self.num_groups, "group index out of bounds");
        self.weights[feature * self.num_groups + group]
    }

    /// Bias for a group.
    #[inline]
    pub fn bias(&self, group: usize) -> f32 {
        debug_assert!(group < self.num_groups, "group index out of bounds");
        self.weights[self.num_features * self.num_groups + group]
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// `bias(g) + Σ x_f * weight(f, g)`, skipping missing features.
    pub fn predict_group<F: FeatureVector + ?Sized>(&self, features: &F, group: usize) -> f32 {
        let mut sum = self.bias(group);
        for f in 0..self.num_features {
            let x = features.feature(f);
            if !x.is_nan() {
                sum += x * self.weight(f, group);
            }
        }
        sum
    }

    /// Raw score for every group.
    pub fn predict<F: FeatureVector + ?Sized>(&self, features: &F) -> Vec<f32> {
        (0..self.num_groups)
            .map(|g| self.predict_group(features, g))
            .collect()
    }

    /// Raw score of a single-output model.
    pub fn predict_single<F: FeatureVector + ?Sized>(&self, features: &F) -> Result<f32, PredictError> {
        if self.num_groups != 1 {
            return Err(PredictError::NotSingleOutput {
                n_groups: self.num_groups,
            });
        }
        Ok(self.predict_group(features, 0))
    }

    /// Leaf indices do not exist for a linear model.
    pub fn predict_leaf<F: FeatureVector + ?Sized>(&self, _features: &F) -> Result<Vec<u32>, PredictError> {
        Err(PredictError::LeafIndexUnsupported)
    }
}
