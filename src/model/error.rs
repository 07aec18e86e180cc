//! Load and prediction errors.

use thiserror::Error;

use crate::io::ReadError;
use crate::repr::gbdt::TreeValidationError;

/// Errors raised while loading a model. Any of them aborts the load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("unsupported objective: {0:?}")]
    UnsupportedObjective(String),

    #[error("unsupported booster: {0:?}")]
    UnsupportedBooster(String),

    #[error("tree {tree} is malformed: {error}")]
    InvalidTree {
        tree: usize,
        #[source]
        error: TreeValidationError,
    },

    #[error("tree {tree} assigned to group {group}, but the model has {n_groups} groups")]
    TreeGroupOutOfRange {
        tree: usize,
        group: i32,
        n_groups: usize,
    },
}

/// A prediction request the loaded model cannot answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("single-value prediction needs one output group, model has {n_groups}")]
    NotSingleOutput { n_groups: usize },

    #[error("leaf indices undefined for a linear ensemble")]
    LeafIndexUnsupported,

    #[error("{transform} needs the full output vector")]
    SingleValueUnsupported { transform: &'static str },

    #[error("root {root} out of range: trees have {num_roots} roots")]
    RootOutOfRange { root: usize, num_roots: usize },
}
