//! Loaded models and prediction.
//!
//! - [`Predictor`]: loads a model stream and serves predictions
//! - [`ModelHeader`]: the decoded top-level header
//! - [`Booster`]: tree or linear ensemble, selected by name
//! - [`OutputTransform`]: post-processing applied to raw margins
//! - [`ObjectiveRegistry`]: objective name → transform table
//! - [`PredictorConfig`], [`PredictOptions`]: construction and per-call settings

mod booster;
mod config;
mod error;
mod header;
mod objective;
mod predictor;
mod transform;

pub use booster::{Booster, BoosterKind};
pub use config::{PredictOptions, PredictorConfig};
pub use error::{LoadError, PredictError};
pub use header::{HeaderFormat, LegacyMarker, ModelHeader};
pub use objective::ObjectiveRegistry;
pub use predictor::Predictor;
pub use transform::{OutputTransform, argmax, sigmoid, softmax_inplace};
