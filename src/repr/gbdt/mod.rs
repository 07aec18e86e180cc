//! Gradient-boosted decision tree representation.

/// Node index within a tree.
pub type NodeId = u32;

pub mod forest;
pub mod node;
pub mod tree;

pub use forest::{Forest, ForestParam};
pub use node::{LEAF_MARKER, Node, NodeStat};
pub use tree::{Tree, TreeParam, TreeValidationError};
