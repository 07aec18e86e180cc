//! Tree ensemble with output-group assignment.

use std::io::Read;

use tracing::{debug, trace, warn};

use super::{NodeId, Tree};
use crate::data::FeatureVector;
use crate::io::{ModelReader, ReadError};
use crate::model::{LoadError, PredictError};

// ============================================================================
// ForestParam
// ============================================================================

/// Ensemble parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParam {
    pub num_trees: usize,
    pub num_roots: usize,
    pub num_feature: usize,
    pub num_pbuffer: i64,
    pub num_output_group: usize,
    pub size_leaf_vector: i32,
}

impl ForestParam {
    const RESERVED: usize = 31;

    fn read<R: Read>(reader: &mut ModelReader<R>) -> Result<Self, ReadError> {
        let num_trees = reader.read_count("num_trees")?;
        let num_roots = reader.read_count("num_roots")?;
        let num_feature = reader.read_count("num_feature")?;
        let _ = reader.read_i32()?;
        let num_pbuffer = reader.read_i64()?;
        let num_output_group = reader.read_count("num_output_group")?;
        let size_leaf_vector = reader.read_i32()?;
        reader.read_i32_array(Self::RESERVED)?;
        let _ = reader.read_i32()?;

        Ok(Self {
            num_trees,
            num_roots,
            num_feature,
            num_pbuffer,
            num_output_group,
            size_leaf_vector,
        })
    }

    /// Byte size of one serialized prediction-buffer region.
    fn pbuffer_bytes(&self) -> Result<u64, ReadError> {
        let overflow = |value: i64| ReadError::Overflow {
            what: "prediction buffer size",
            value,
        };
        let leaf_words = i64::from(self.size_leaf_vector) + 1;
        let groups = i64::try_from(self.num_output_group).map_err(|_| overflow(i64::MAX))?;

        let words = groups
            .checked_mul(self.num_pbuffer)
            .and_then(|w| w.checked_mul(leaf_words))
            .and_then(|w| w.checked_mul(4))
            .ok_or(overflow(self.num_pbuffer))?;
        u64::try_from(words).map_err(|_| overflow(words))
    }
}

// ============================================================================
// Forest
// ============================================================================

/// Ordered trees plus their output-group assignment.
///
/// `tree_info[i]` is the group of tree `i`. The per-group lists keep the
/// stored order, so `group_trees(g)` is a subsequence of `0..n_trees()`.
#[derive(Debug, Clone)]
pub struct Forest {
    param: ForestParam,
    trees: Vec<Tree>,
    tree_info: Vec<u32>,
    groups: Vec<Vec<usize>>,
    /// Roots valid for every tree.
    root_limit: usize,
}

impl Forest {
    /// Assemble a forest from validated trees.
    ///
    /// # Panics
    ///
    /// Panics if `tree_info.len() != trees.len()`.
    pub fn from_trees(
        trees: Vec<Tree>,
        tree_info: Vec<i32>,
        num_output_group: usize,
    ) -> Result<Self, LoadError> {
        let param = ForestParam {
            num_trees: trees.len(),
            num_roots: 1,
            num_feature: 0,
            num_pbuffer: 0,
            num_output_group,
            size_leaf_vector: 0,
        };
        Self::assemble(param, trees, tree_info)
    }

    fn assemble(
        param: ForestParam,
        trees: Vec<Tree>,
        tree_info: Vec<i32>,
    ) -> Result<Self, LoadError> {
        assert_eq!(
            tree_info.len(),
            trees.len(),
            "tree_info length {} doesn't match tree count {}",
            tree_info.len(),
            trees.len()
        );

        let n_groups = param.num_output_group;
        let mut groups = vec![Vec::new(); n_groups];
        let mut info = Vec::with_capacity(tree_info.len());
        for (tree, &group) in tree_info.iter().enumerate() {
            let slot = usize::try_from(group)
                .ok()
                .and_then(|g| groups.get_mut(g))
                .ok_or(LoadError::TreeGroupOutOfRange {
                    tree,
                    group,
                    n_groups,
                })?;
            slot.push(tree);
            info.push(group as u32);
        }

        let root_limit = trees
            .iter()
            .map(Tree::num_roots)
            .min()
            .unwrap_or(usize::MAX);

        Ok(Self {
            param,
            trees,
            tree_info: info,
            groups,
            root_limit,
        })
    }

    /// Decode the ensemble section of a model stream.
    ///
    /// Reads the parameter block, `num_trees` trees, the `tree_info` array,
    /// and, when `with_pbuffer` is set and the buffer is non-empty, skips the
    /// two serialized prediction-buffer regions.
    pub fn read<R: Read>(reader: &mut ModelReader<R>, with_pbuffer: bool) -> Result<Self, LoadError> {
        let param = ForestParam::read(reader)?;

        let mut trees = Vec::new();
        for i in 0..param.num_trees {
            let tree = Tree::decode(reader)?;
            tree.validate()
                .map_err(|error| LoadError::InvalidTree { tree: i, error })?;
            trace!(
                tree = i,
                nodes = tree.n_nodes(),
                max_depth = tree.param().max_depth,
                "decoded tree"
            );
            trees.push(tree);
        }

        let tree_info = if param.num_trees > 0 {
            reader.read_i32_array(param.num_trees)?
        } else {
            Vec::new()
        };

        if with_pbuffer && param.num_pbuffer != 0 {
            let bytes = param.pbuffer_bytes()?;
            warn!(
                num_pbuffer = param.num_pbuffer,
                bytes = 2 * bytes,
                "skipping serialized prediction buffer"
            );
            reader.skip(bytes)?;
            reader.skip(bytes)?;
        }

        let forest = Self::assemble(param, trees, tree_info)?;
        debug!(
            trees = forest.n_trees(),
            groups = forest.n_groups(),
            "loaded tree ensemble"
        );
        Ok(forest)
    }

    #[inline]
    pub fn param(&self) -> &ForestParam {
        &self.param
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn n_groups(&self) -> usize {
        self.param.num_output_group
    }

    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Group assignment per tree, in stored order.
    #[inline]
    pub fn tree_info(&self) -> &[u32] {
        &self.tree_info
    }

    /// Indices of the trees in `group`, in stored order.
    #[inline]
    pub fn group_trees(&self, group: usize) -> &[usize] {
        &self.groups[group]
    }

    fn check_root(&self, root: usize) -> Result<(), PredictError> {
        if root < self.root_limit {
            Ok(())
        } else {
            Err(PredictError::RootOutOfRange {
                root,
                num_roots: self.root_limit,
            })
        }
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Sum of leaf values over the first `ntree_limit` trees of `group`.
    ///
    /// `ntree_limit == 0` means every tree in the group.
    ///
    /// # Panics
    ///
    /// Panics if `group >= n_groups()` or `root` is not a root of every tree.
    pub fn predict_group<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        group: usize,
        root: usize,
        ntree_limit: usize,
    ) -> f32 {
        let trees = &self.groups[group];
        let n = limit(trees.len(), ntree_limit);
        trees[..n]
            .iter()
            .fold(0.0, |sum, &t| sum + self.trees[t].leaf_value(features, root))
    }

    /// Raw per-group sums, starting every tree at `root`.
    pub fn predict<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        root: usize,
        ntree_limit: usize,
    ) -> Result<Vec<f32>, PredictError> {
        self.check_root(root)?;
        Ok((0..self.n_groups())
            .map(|g| self.predict_group(features, g, root, ntree_limit))
            .collect())
    }

    /// Raw sum for a single-output ensemble.
    ///
    /// Always starts at root 0; the root used by [`predict`](Self::predict)
    /// does not apply here.
    pub fn predict_single<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        ntree_limit: usize,
    ) -> Result<f32, PredictError> {
        if self.n_groups() != 1 {
            return Err(PredictError::NotSingleOutput {
                n_groups: self.n_groups(),
            });
        }
        self.check_root(0)?;
        Ok(self.predict_group(features, 0, 0, ntree_limit))
    }

    /// Leaf index reached in each of the first `ntree_limit` trees.
    ///
    /// One entry per tree in stored order across all groups, from root 0.
    pub fn predict_leaf<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        ntree_limit: usize,
    ) -> Result<Vec<NodeId>, PredictError> {
        self.check_root(0)?;
        let n = limit(self.trees.len(), ntree_limit);
        Ok(self.trees[..n]
            .iter()
            .map(|tree| tree.leaf_index(features, 0))
            .collect())
    }
}

/// Trees to evaluate out of `available`; zero means all.
#[inline]
fn limit(available: usize, ntree_limit: usize) -> usize {
    if ntree_limit == 0 {
        available
    } else {
        ntree_limit.min(available)
    }
}
