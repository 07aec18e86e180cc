//! xgboost-predictor: loader and evaluator for legacy XGBoost binary models.
//!
//! Decodes the pre-JSON binary serialization (tree ensembles and linear
//! boosters) and reproduces the reference predictions bit for bit, including
//! the single-precision exponential used by sigmoid and softmax.
//!
//! # Key Types
//!
//! - [`Predictor`] - A loaded model: header, booster, output transform
//! - [`PredictorConfig`] / [`PredictOptions`] - Load-time and per-call settings
//! - [`FeatureVector`] - Anything that can answer "value of feature `i`"
//! - [`ObjectiveRegistry`] - Objective name → output transform table
//!
//! # Example
//!
//! ```
//! use xgboost_predictor::{PredictOptions, Predictor};
//! use xgboost_predictor::testing::{ModelWriter, TestModel};
//!
//! let bytes = ModelWriter::new().model(&TestModel::single_split("reg:linear", 0.5));
//! let predictor = Predictor::from_slice(&bytes).unwrap();
//!
//! // NaN is missing; the split sends missing values left.
//! let out = predictor.predict(&[f32::NAN][..], PredictOptions::default()).unwrap();
//! assert_eq!(out, vec![-0.5]);
//! ```

pub mod data;
pub mod io;
pub mod math;
pub mod model;
pub mod repr;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use model::{
    Booster, BoosterKind, LoadError, ModelHeader, ObjectiveRegistry, OutputTransform,
    PredictError, PredictOptions, Predictor, PredictorConfig,
};

pub use data::{DenseFeatures, FeatureVector, SparseFeatures};

pub use io::ReadError;
pub use math::ExpBackend;
