//! Booster selection and dispatch.

use std::fmt;
use std::io::Read;

use super::{LoadError, PredictError};
use crate::data::FeatureVector;
use crate::io::ModelReader;
use crate::repr::gbdt::{Forest, NodeId};
use crate::repr::gblinear::LinearModel;

/// Booster kind named in the model header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoosterKind {
    Tree,
    Linear,
}

impl BoosterKind {
    /// Resolve `"gbtree"` or `"gblinear"`.
    pub fn from_name(name: &str) -> Result<Self, LoadError> {
        match name {
            "gbtree" => Ok(Self::Tree),
            "gblinear" => Ok(Self::Linear),
            other => Err(LoadError::UnsupportedBooster(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Tree => "gbtree",
            Self::Linear => "gblinear",
        }
    }
}

impl fmt::Display for BoosterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A loaded booster.
#[derive(Debug, Clone)]
pub enum Booster {
    Tree(Forest),
    Linear(LinearModel),
}

impl Booster {
    /// Decode the booster section for `kind`.
    pub fn read<R: Read>(
        kind: BoosterKind,
        reader: &mut ModelReader<R>,
        with_pbuffer: bool,
    ) -> Result<Self, LoadError> {
        match kind {
            BoosterKind::Tree => Ok(Booster::Tree(Forest::read(reader, with_pbuffer)?)),
            BoosterKind::Linear => Ok(Booster::Linear(LinearModel::read(reader)?)),
        }
    }

    pub fn kind(&self) -> BoosterKind {
        match self {
            Booster::Tree(_) => BoosterKind::Tree,
            Booster::Linear(_) => BoosterKind::Linear,
        }
    }

    /// Number of output groups.
    pub fn n_groups(&self) -> usize {
        match self {
            Booster::Tree(forest) => forest.n_groups(),
            Booster::Linear(model) => model.num_groups(),
        }
    }

    /// Raw per-group scores. `root` and `ntree_limit` apply to trees only.
    pub fn predict<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        root: usize,
        ntree_limit: usize,
    ) -> Result<Vec<f32>, PredictError> {
        match self {
            Booster::Tree(forest) => forest.predict(features, root, ntree_limit),
            Booster::Linear(model) => Ok(model.predict(features)),
        }
    }

    /// Raw score of a single-output booster.
    pub fn predict_single<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        ntree_limit: usize,
    ) -> Result<f32, PredictError> {
        match self {
            Booster::Tree(forest) => forest.predict_single(features, ntree_limit),
            Booster::Linear(model) => model.predict_single(features),
        }
    }

    /// Leaf index per tree; unsupported for linear boosters.
    pub fn predict_leaf<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        ntree_limit: usize,
    ) -> Result<Vec<NodeId>, PredictError> {
        match self {
            Booster::Tree(forest) => forest.predict_leaf(features, ntree_limit),
            Booster::Linear(model) => model.predict_leaf(features),
        }
    }

    pub fn as_forest(&self) -> Option<&Forest> {
        match self {
            Booster::Tree(forest) => Some(forest),
            Booster::Linear(_) => None,
        }
    }

    pub fn as_linear(&self) -> Option<&LinearModel> {
        match self {
            Booster::Linear(model) => Some(model),
            Booster::Tree(_) => None,
        }
    }
}
