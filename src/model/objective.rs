//! Objective name → output transform table.
//!
//! Replaces a process-wide mutable registry with a plain value: build one,
//! optionally [`register`](ObjectiveRegistry::register) extra names, and hand
//! it to the predictor through [`PredictorConfig`](super::PredictorConfig).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{LoadError, OutputTransform};

const BUILTIN: &[(&str, OutputTransform)] = &[
    ("reg:linear", OutputTransform::Identity),
    ("reg:squarederror", OutputTransform::Identity),
    ("binary:logitraw", OutputTransform::Identity),
    ("rank:pairwise", OutputTransform::Identity),
    ("rank:ndcg", OutputTransform::Identity),
    ("rank:map", OutputTransform::Identity),
    ("binary:logistic", OutputTransform::Sigmoid),
    ("reg:logistic", OutputTransform::Sigmoid),
    ("multi:softprob", OutputTransform::Softmax),
    ("multi:softmax", OutputTransform::SoftmaxArgmax),
];

/// Objective names the predictor understands.
///
/// # Example
///
/// ```
/// use xgboost_predictor::model::{ObjectiveRegistry, OutputTransform};
///
/// let mut registry = ObjectiveRegistry::default();
/// assert_eq!(registry.get("binary:logistic"), Some(OutputTransform::Sigmoid));
///
/// registry.register("count:poisson_margin", OutputTransform::Identity);
/// assert!(registry.resolve("count:poisson_margin").is_ok());
/// assert!(registry.resolve("survival:cox").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectiveRegistry {
    entries: HashMap<String, OutputTransform>,
}

impl ObjectiveRegistry {
    /// A registry with no names.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Map `name` to `transform`, returning the previous mapping.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        transform: OutputTransform,
    ) -> Option<OutputTransform> {
        self.entries.insert(name.into(), transform)
    }

    pub fn get(&self, name: &str) -> Option<OutputTransform> {
        self.entries.get(name).copied()
    }

    /// Look up `name`, failing with [`LoadError::UnsupportedObjective`].
    pub fn resolve(&self, name: &str) -> Result<OutputTransform, LoadError> {
        self.get(name)
            .ok_or_else(|| LoadError::UnsupportedObjective(name.to_string()))
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ObjectiveRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for &(name, transform) in BUILTIN {
            registry.register(name, transform);
        }
        registry
    }
}
