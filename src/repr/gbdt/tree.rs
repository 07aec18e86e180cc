//! Regression tree: a flat node array with per-node statistics.
//!
//! Trees are array-indexed; children are indices into the same array and a
//! tree may have several roots (`0..num_roots`). Every [`Tree`] reachable
//! through the public API has passed [`Tree::validate`], so traversal from
//! any root always terminates at a leaf.

use std::io::Read;

use thiserror::Error;

use super::{Node, NodeId, NodeStat};
use crate::data::FeatureVector;
use crate::io::{ModelReader, ReadError};

// ============================================================================
// TreeParam
// ============================================================================

/// Per-tree parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParam {
    pub num_roots: usize,
    pub num_nodes: usize,
    pub num_deleted: i32,
    pub max_depth: i32,
    pub num_feature: usize,
    pub size_leaf_vector: i32,
}

impl TreeParam {
    const RESERVED: usize = 31;

    pub(crate) fn read<R: Read>(reader: &mut ModelReader<R>) -> Result<Self, ReadError> {
        let param = Self {
            num_roots: reader.read_count("num_roots")?,
            num_nodes: reader.read_count("num_nodes")?,
            num_deleted: reader.read_i32()?,
            max_depth: reader.read_i32()?,
            num_feature: reader.read_count("num_feature")?,
            size_leaf_vector: reader.read_i32()?,
        };
        reader.read_i32_array(Self::RESERVED)?;
        Ok(param)
    }
}

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeValidationError {
    #[error("tree has no nodes")]
    EmptyTree,

    #[error("{n_nodes} nodes but {num_roots} roots")]
    TooManyRoots { num_roots: usize, n_nodes: usize },

    #[error("node {node} has {side} child {child} outside 0..{n_nodes}")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: i32,
        n_nodes: usize,
    },

    #[error("node {node} is its own child")]
    SelfLoop { node: NodeId },

    #[error("cycle through node {node}")]
    CycleDetected { node: NodeId },

    #[error("{stats} statistics records for {n_nodes} nodes")]
    StatsLenMismatch { stats: usize, n_nodes: usize },
}

// ============================================================================
// Tree
// ============================================================================

/// A decoded regression tree.
#[derive(Debug, Clone)]
pub struct Tree {
    param: TreeParam,
    nodes: Box<[Node]>,
    stats: Box<[NodeStat]>,
}

impl Tree {
    /// Build a single-root tree from nodes, with zeroed statistics.
    ///
    /// # Example
    ///
    /// ```
    /// use xgboost_predictor::repr::gbdt::{Node, Tree};
    ///
    /// let tree = Tree::new(vec![
    ///     Node::split(-1, 1, 2, 0, 0.5, true),
    ///     Node::leaf(0, -1.0),
    ///     Node::leaf(0, 2.0),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(tree.leaf_value(&[0.3f32][..], 0), -1.0);
    /// assert_eq!(tree.leaf_value(&[0.7f32][..], 0), 2.0);
    /// assert_eq!(tree.leaf_value(&[f32::NAN][..], 0), -1.0);
    /// ```
    pub fn new(nodes: Vec<Node>) -> Result<Self, TreeValidationError> {
        let stats = vec![NodeStat::default(); nodes.len()];
        let param = TreeParam {
            num_roots: 1,
            num_nodes: nodes.len(),
            num_deleted: 0,
            max_depth: 0,
            num_feature: 0,
            size_leaf_vector: 0,
        };
        Self::from_parts(param, nodes, stats)
    }

    /// Build a tree from all of its decoded parts.
    pub fn from_parts(
        param: TreeParam,
        nodes: Vec<Node>,
        stats: Vec<NodeStat>,
    ) -> Result<Self, TreeValidationError> {
        let tree = Self {
            param,
            nodes: nodes.into_boxed_slice(),
            stats: stats.into_boxed_slice(),
        };
        tree.validate()?;
        Ok(tree)
    }

    /// Decode a tree without validating it.
    ///
    /// Reads the parameter block, `num_nodes` node records, then `num_nodes`
    /// statistics records.
    pub(crate) fn decode<R: Read>(reader: &mut ModelReader<R>) -> Result<Self, ReadError> {
        let param = TreeParam::read(reader)?;
        let nodes = (0..param.num_nodes)
            .map(|_| Node::read(reader))
            .collect::<Result<Vec<_>, _>>()?;
        let stats = (0..param.num_nodes)
            .map(|_| NodeStat::read(reader))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            param,
            nodes: nodes.into_boxed_slice(),
            stats: stats.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn param(&self) -> &TreeParam {
        &self.param
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn num_roots(&self) -> usize {
        self.param.num_roots
    }

    #[inline]
    pub fn node(&self, idx: NodeId) -> &Node {
        &self.nodes[idx as usize]
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn stats(&self) -> &[NodeStat] {
        &self.stats
    }

    /// Walk from `root` to a leaf and return the leaf's index.
    ///
    /// A NaN feature follows the node's default child; otherwise
    /// `value < split_cond` goes left and everything else goes right.
    ///
    /// # Panics
    ///
    /// Panics if `root >= num_roots()`.
    pub fn leaf_index<F: FeatureVector + ?Sized>(&self, features: &F, root: usize) -> NodeId {
        assert!(root < self.param.num_roots, "root {root} out of range");
        let mut idx = root;

        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return idx as NodeId;
            }

            let fvalue = features.feature(node.split_index() as usize);
            let next = if fvalue.is_nan() {
                node.default_child()
            } else if fvalue < node.split_cond() {
                node.left()
            } else {
                node.right()
            };
            idx = next as usize;
        }
    }

    /// Walk from `root` to a leaf and return the leaf's value.
    #[inline]
    pub fn leaf_value<F: FeatureVector + ?Sized>(&self, features: &F, root: usize) -> f32 {
        let leaf = self.leaf_index(features, root);
        self.nodes[leaf as usize].leaf_value()
    }

    /// Validate the structure reachable from the roots.
    ///
    /// Checks child bounds, self loops and cycles. Nodes unreachable from any
    /// root (deleted nodes) are allowed, as are subtrees shared by several
    /// parents.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.nodes.len();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }
        if self.stats.len() != n_nodes {
            return Err(TreeValidationError::StatsLenMismatch {
                stats: self.stats.len(),
                n_nodes,
            });
        }
        if self.param.num_roots > n_nodes {
            return Err(TreeValidationError::TooManyRoots {
                num_roots: self.param.num_roots,
                n_nodes,
            });
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(usize, bool)> = Vec::new();

        for root in 0..self.param.num_roots {
            stack.push((root, false));

            while let Some((node, exiting)) = stack.pop() {
                if exiting {
                    color[node] = 2;
                    continue;
                }
                match color[node] {
                    0 => {}
                    1 => {
                        return Err(TreeValidationError::CycleDetected {
                            node: node as NodeId,
                        });
                    }
                    _ => continue,
                }

                color[node] = 1;
                stack.push((node, true));

                let n = &self.nodes[node];
                if n.is_leaf() {
                    continue;
                }
                for (side, child) in [("right", n.right()), ("left", n.left())] {
                    if child < 0 || child as usize >= n_nodes {
                        return Err(TreeValidationError::ChildOutOfBounds {
                            node: node as NodeId,
                            side,
                            child,
                            n_nodes,
                        });
                    }
                    if child as usize == node {
                        return Err(TreeValidationError::SelfLoop {
                            node: node as NodeId,
                        });
                    }
                    stack.push((child as usize, false));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn single_split() -> Tree {
        Tree::new(vec![
            Node::split(-1, 1, 2, 0, 0.5, true),
            Node::leaf(0, -1.0),
            Node::leaf(0, 2.0),
        ])
        .unwrap()
    }

    #[test]
    fn single_split_routing() {
        let tree = single_split();
        assert_eq!(tree.leaf_value(&[0.3f32][..], 0), -1.0);
        assert_eq!(tree.leaf_value(&[0.7f32][..], 0), 2.0);
        assert_eq!(tree.leaf_value(&[0.5f32][..], 0), 2.0);
        assert_eq!(tree.leaf_value(&[f32::NAN][..], 0), -1.0);
        // Absent feature behaves like NaN.
        assert_eq!(tree.leaf_value(&[0.0f32; 0][..], 0), -1.0);
        assert_eq!(tree.leaf_index(&[0.7f32][..], 0), 2);
    }

    #[test]
    fn default_right_routing() {
        let tree = Tree::new(vec![
            Node::split(-1, 1, 2, 3, 0.0, false),
            Node::leaf(0, 10.0),
            Node::leaf(0, 20.0),
        ])
        .unwrap();
        let empty: HashMap<usize, f32> = HashMap::new();
        assert_eq!(tree.leaf_value(&empty, 0), 20.0);
        assert_eq!(tree.leaf_value(&[0.0, 0.0, 0.0, -1.0f32][..], 0), 10.0);
    }

    #[test]
    fn deeper_tree() {
        //        0: f0 < 1
        //       /          \
        //  1: f1 < 5      2: leaf 3
        //   /     \
        // 3: 1   4: 2
        let tree = Tree::new(vec![
            Node::split(-1, 1, 2, 0, 1.0, false),
            Node::split(0, 3, 4, 1, 5.0, false),
            Node::leaf(0, 3.0),
            Node::leaf(1, 1.0),
            Node::leaf(1, 2.0),
        ])
        .unwrap();
        assert_eq!(tree.leaf_index(&[0.0f32, 4.0][..], 0), 3);
        assert_eq!(tree.leaf_index(&[0.0f32, 6.0][..], 0), 4);
        assert_eq!(tree.leaf_index(&[2.0f32][..], 0), 2);
        // Missing f1 defaults right.
        assert_eq!(tree.leaf_value(&[0.0f32][..], 0), 2.0);
    }

    #[test]
    fn multiple_roots() {
        let param = TreeParam {
            num_roots: 2,
            num_nodes: 2,
            num_deleted: 0,
            max_depth: 0,
            num_feature: 0,
            size_leaf_vector: 0,
        };
        let tree = Tree::from_parts(
            param,
            vec![Node::leaf(-1, 1.0), Node::leaf(-1, 5.0)],
            vec![NodeStat::default(); 2],
        )
        .unwrap();
        assert_eq!(tree.leaf_value(&[0.0f32; 0][..], 0), 1.0);
        assert_eq!(tree.leaf_value(&[0.0f32; 0][..], 1), 5.0);
    }

    #[test]
    fn unreachable_nodes_are_allowed() {
        let tree = Tree::new(vec![Node::leaf(-1, 0.5), Node::leaf(-1, 9.0)]).unwrap();
        assert_eq!(tree.leaf_value(&[0.0f32; 0][..], 0), 0.5);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Tree::new(vec![]).unwrap_err(), TreeValidationError::EmptyTree);
    }

    #[test]
    fn rejects_out_of_bounds_child() {
        let err = Tree::new(vec![
            Node::split(-1, 1, 5, 0, 0.5, true),
            Node::leaf(0, 1.0),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TreeValidationError::ChildOutOfBounds {
                node: 0,
                side: "right",
                child: 5,
                n_nodes: 2,
            }
        );
    }

    #[test]
    fn rejects_negative_child_on_split() {
        let err = Tree::new(vec![
            Node::split(-1, 1, -2, 0, 0.5, true),
            Node::leaf(0, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, TreeValidationError::ChildOutOfBounds { child: -2, .. }));
    }

    #[test]
    fn rejects_self_loop() {
        let err = Tree::new(vec![
            Node::split(-1, 0, 1, 0, 0.5, true),
            Node::leaf(0, 1.0),
        ])
        .unwrap_err();
        assert_eq!(err, TreeValidationError::SelfLoop { node: 0 });
    }

    #[test]
    fn rejects_cycle() {
        let err = Tree::new(vec![
            Node::split(-1, 1, 2, 0, 0.5, true),
            Node::split(0, 0, 2, 0, 0.5, true),
            Node::leaf(0, 1.0),
        ])
        .unwrap_err();
        assert_eq!(err, TreeValidationError::CycleDetected { node: 0 });
    }

    #[test]
    fn rejects_too_many_roots() {
        let param = TreeParam {
            num_roots: 3,
            num_nodes: 1,
            num_deleted: 0,
            max_depth: 0,
            num_feature: 0,
            size_leaf_vector: 0,
        };
        let err = Tree::from_parts(param, vec![Node::leaf(-1, 0.0)], vec![NodeStat::default()])
            .unwrap_err();
        assert_eq!(
            err,
            TreeValidationError::TooManyRoots {
                num_roots: 3,
                n_nodes: 1
            }
        );
    }

    #[test]
    #[should_panic(expected = "root 1 out of range")]
    fn traversal_rejects_unknown_root() {
        single_split().leaf_index(&[0.0f32][..], 1);
    }
}
