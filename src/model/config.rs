//! Predictor configuration.
//!
//! # Example
//!
//! ```
//! use xgboost_predictor::math::ExpBackend;
//! use xgboost_predictor::model::{OutputTransform, PredictOptions, PredictorConfig};
//!
//! // All defaults: objective from the file, reference exponential.
//! let config = PredictorConfig::default();
//! assert!(config.objective.is_none());
//!
//! // Force raw margins and the fast exponential.
//! let config = PredictorConfig::builder()
//!     .objective(OutputTransform::Identity)
//!     .exp_backend(ExpBackend::Fast)
//!     .build();
//!
//! let options = PredictOptions::builder().ntree_limit(10).output_margin(true).build();
//! assert_eq!(options.root_index, 0);
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::{ObjectiveRegistry, OutputTransform};
use crate::math::ExpBackend;

// =============================================================================
// PredictorConfig
// =============================================================================

/// Construction-time settings for a [`Predictor`](super::Predictor).
///
/// Deserializable from a config file; absent fields take their defaults.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Transform to use instead of the objective named in the file.
    ///
    /// The file's objective name is still decoded, but not resolved, so an
    /// unknown name is tolerated when this is set.
    pub objective: Option<OutputTransform>,

    /// Exponential used by sigmoid and softmax. Default: `Reference`.
    #[builder(default)]
    pub exp_backend: ExpBackend,

    /// Objective names resolved when no override is given.
    /// Default: the built-in table. A deserialized table replaces it.
    #[builder(default)]
    pub registry: ObjectiveRegistry,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

// =============================================================================
// PredictOptions
// =============================================================================

/// Per-call prediction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictOptions {
    /// Trees per group to evaluate; 0 evaluates all of them.
    #[builder(default)]
    pub ntree_limit: usize,

    /// Return margins (ensemble output plus base score) without the transform.
    #[builder(default)]
    pub output_margin: bool,

    /// Root every tree starts from on the multi-output path.
    #[builder(default)]
    pub root_index: usize,
}
