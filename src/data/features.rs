//! Feature access for a single sample.
//!
//! Evaluation reads features through one method, [`FeatureVector::feature`],
//! which returns `f32::NAN` for anything missing. Storage shape (dense slice
//! or sparse map) and missing-value policy (whether a literal zero counts as
//! missing) are independent of each other and of the evaluators.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use xgboost_predictor::data::{DenseFeatures, FeatureVector, SparseFeatures};
//!
//! let dense = DenseFeatures::new(&[0.0f32, 2.0]).zero_as_missing(true);
//! assert!(dense.feature(0).is_nan());
//! assert_eq!(dense.feature(1), 2.0);
//! assert!(dense.feature(5).is_nan());
//!
//! let map: HashMap<usize, f64> = [(3, 1.5)].into_iter().collect();
//! let sparse = SparseFeatures::new(&map);
//! assert_eq!(sparse.feature(3), 1.5);
//! assert!(sparse.feature(0).is_nan());
//! ```

use std::collections::HashMap;

// ============================================================================
// FeatureVector
// ============================================================================

/// Read-only mapping from feature index to value.
///
/// Implementations return `f32::NAN` for absent indices. Trees route NaN
/// through the node's default direction; the linear model skips it.
pub trait FeatureVector {
    /// Value of feature `index`, or NaN if missing.
    fn feature(&self, index: usize) -> f32;
}

impl FeatureVector for [f32] {
    #[inline]
    fn feature(&self, index: usize) -> f32 {
        self.get(index).copied().unwrap_or(f32::NAN)
    }
}

impl<const N: usize> FeatureVector for [f32; N] {
    #[inline]
    fn feature(&self, index: usize) -> f32 {
        self.as_slice().feature(index)
    }
}

impl FeatureVector for Vec<f32> {
    #[inline]
    fn feature(&self, index: usize) -> f32 {
        self.as_slice().feature(index)
    }
}

impl FeatureVector for HashMap<usize, f32> {
    #[inline]
    fn feature(&self, index: usize) -> f32 {
        self.get(&index).copied().unwrap_or(f32::NAN)
    }
}

impl<T: FeatureVector + ?Sized> FeatureVector for &T {
    #[inline]
    fn feature(&self, index: usize) -> f32 {
        (**self).feature(index)
    }
}

// ============================================================================
// FeatureScalar
// ============================================================================

/// Element types accepted by the dense and sparse adapters.
pub trait FeatureScalar: Copy {
    /// Narrow to the evaluation precision.
    fn to_f32(self) -> f32;

    /// Exact zero test on the stored value, before narrowing.
    fn is_zero(self) -> bool;
}

impl FeatureScalar for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn is_zero(self) -> bool {
        self == 0.0
    }
}

impl FeatureScalar for f64 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn is_zero(self) -> bool {
        self == 0.0
    }
}

#[inline]
fn apply_policy<T: FeatureScalar>(value: Option<T>, zero_as_missing: bool) -> f32 {
    match value {
        Some(v) if zero_as_missing && v.is_zero() => f32::NAN,
        Some(v) => v.to_f32(),
        None => f32::NAN,
    }
}

// ============================================================================
// Dense
// ============================================================================

/// Dense feature slice with an optional zero-as-missing policy.
///
/// Indices past the end of the slice are missing. NaN entries are missing
/// regardless of policy.
#[derive(Debug, Clone, Copy)]
pub struct DenseFeatures<'a, T = f32> {
    values: &'a [T],
    zero_as_missing: bool,
}

impl<'a, T: FeatureScalar> DenseFeatures<'a, T> {
    /// Wrap a slice; zero is an ordinary value.
    pub fn new(values: &'a [T]) -> Self {
        Self {
            values,
            zero_as_missing: false,
        }
    }

    /// Set whether an exact `0.0` is reported as missing.
    pub fn zero_as_missing(mut self, enabled: bool) -> Self {
        self.zero_as_missing = enabled;
        self
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: FeatureScalar> FeatureVector for DenseFeatures<'_, T> {
    #[inline]
    fn feature(&self, index: usize) -> f32 {
        apply_policy(self.values.get(index).copied(), self.zero_as_missing)
    }
}

// ============================================================================
// Sparse
// ============================================================================

/// Sparse index → value map with an optional zero-as-missing policy.
///
/// A present key yields its value; an absent key is missing.
#[derive(Debug, Clone, Copy)]
pub struct SparseFeatures<'a, T = f32> {
    values: &'a HashMap<usize, T>,
    zero_as_missing: bool,
}

impl<'a, T: FeatureScalar> SparseFeatures<'a, T> {
    /// Wrap a map; zero is an ordinary value.
    pub fn new(values: &'a HashMap<usize, T>) -> Self {
        Self {
            values,
            zero_as_missing: false,
        }
    }

    /// Set whether a stored exact `0.0` is reported as missing.
    pub fn zero_as_missing(mut self, enabled: bool) -> Self {
        self.zero_as_missing = enabled;
        self
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }
}

impl<T: FeatureScalar> FeatureVector for SparseFeatures<'_, T> {
    #[inline]
    fn feature(&self, index: usize) -> f32 {
        apply_policy(self.values.get(&index).copied(), self.zero_as_missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn slice_features() {
        let row = [1.0f32, 0.0, f32::NAN];
        assert_eq!(row.feature(0), 1.0);
        assert_eq!(row.feature(1), 0.0);
        assert!(row.feature(2).is_nan());
        assert!(row.feature(3).is_nan());

        let v = vec![4.0f32];
        assert_eq!(v.feature(0), 4.0);
        assert!(v.feature(1).is_nan());
    }

    #[rstest]
    #[case(false, 0, Some(0.0))]
    #[case(true, 0, None)]
    #[case(false, 1, Some(2.5))]
    #[case(true, 1, Some(2.5))]
    #[case(false, 9, None)]
    #[case(true, 9, None)]
    fn dense_policy(#[case] zero_as_missing: bool, #[case] index: usize, #[case] expected: Option<f32>) {
        let values = [0.0f32, 2.5];
        let features = DenseFeatures::new(&values).zero_as_missing(zero_as_missing);
        match expected {
            Some(v) => assert_eq!(features.feature(index), v),
            None => assert!(features.feature(index).is_nan()),
        }
    }

    #[test]
    fn dense_f64_narrows() {
        let values = [0.1f64, 1e300];
        let features = DenseFeatures::new(&values);
        assert_eq!(features.feature(0), 0.1f32);
        assert_eq!(features.feature(1), f32::INFINITY);
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn sparse_present_keys_yield_values() {
        let map: HashMap<usize, f32> = [(0, 0.0), (4, -1.5)].into_iter().collect();
        let features = SparseFeatures::new(&map);
        assert_eq!(features.feature(0), 0.0);
        assert_eq!(features.feature(4), -1.5);
        assert_eq!(features.nnz(), 2);
    }

    #[test]
    fn sparse_absent_keys_are_missing() {
        let map: HashMap<usize, f32> = [(4, -1.5)].into_iter().collect();
        let features = SparseFeatures::new(&map);
        assert!(features.feature(0).is_nan());
        assert!(features.feature(5).is_nan());
        assert!(map.feature(0).is_nan());
        assert_eq!(map.feature(4), -1.5);
    }

    #[test]
    fn sparse_zero_as_missing() {
        let map: HashMap<usize, f64> = [(0, 0.0), (1, 3.0)].into_iter().collect();
        let features = SparseFeatures::new(&map).zero_as_missing(true);
        assert!(features.feature(0).is_nan());
        assert_eq!(features.feature(1), 3.0);
        assert!(features.feature(2).is_nan());
    }

    #[test]
    fn tiny_f64_is_not_zero() {
        let values = [1e-50f64];
        let features = DenseFeatures::new(&values).zero_as_missing(true);
        assert_eq!(features.feature(0), 0.0);
    }
}
