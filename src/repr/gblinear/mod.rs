//! Gradient-boosted linear representation.
//!
//! The weight matrix is stored as a flat array in feature-major, group-minor order:
//!
//! ```text
//! weights[feature * num_groups + group] → coefficient
//! weights[num_features * num_groups + group] → bias
//! ```
//!
//! # Example
//!
//! ```
//! use xgboost_predictor::repr::gblinear::LinearModel;
//!
//! // y = 0.5*x0 + 0.3*x1 + 0.1
//! let weights = vec![0.5, 0.3, 0.1].into_boxed_slice();
//! let model = LinearModel::new(weights, 2, 1);
//!
//! assert_eq!(model.predict_group(&[2.0f32, 1.0][..], 0), 0.1 + 0.5 * 2.0 + 0.3 * 1.0);
//! ```

mod model;

pub use model::{LinearModel, LinearParam};
