//! Feature input for prediction.

mod features;

pub use features::{DenseFeatures, FeatureScalar, FeatureVector, SparseFeatures};
