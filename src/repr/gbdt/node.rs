//! Tree node records.
//!
//! On disk a node is five little-endian words:
//!
//! ```text
//! parent: i32 | left: i32 | right: i32 | sindex: i32 | value: f32
//! ```
//!
//! `sindex` packs the default direction into its sign bit and the split
//! feature into the low 31 bits. `value` is the leaf value for leaves
//! (`left == -1`) and the split threshold otherwise. The split word is
//! unpacked once here so traversal never re-masks.

use std::io::Read;

use crate::io::{ModelReader, ReadError};

const DEFAULT_LEFT_BIT: u32 = 1 << 31;
const SPLIT_INDEX_MASK: u32 = !DEFAULT_LEFT_BIT;

/// Child index marking a leaf.
pub const LEAF_MARKER: i32 = -1;

/// A decoded tree node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    parent: i32,
    left: i32,
    right: i32,
    split_index: u32,
    default_left: bool,
    is_leaf: bool,
    value: f32,
}

impl Node {
    /// Build a node from its on-disk fields.
    pub fn from_raw(parent: i32, left: i32, right: i32, sindex: i32, value: f32) -> Self {
        let sindex = sindex as u32;
        let is_leaf = left == LEAF_MARKER;
        Self {
            parent,
            left,
            right,
            split_index: sindex & SPLIT_INDEX_MASK,
            default_left: sindex & DEFAULT_LEFT_BIT != 0,
            is_leaf,
            value,
        }
    }

    /// A leaf carrying `value`.
    pub fn leaf(parent: i32, value: f32) -> Self {
        Self::from_raw(parent, LEAF_MARKER, LEAF_MARKER, 0, value)
    }

    /// An internal node sending `feature < threshold` left.
    ///
    /// # Panics
    ///
    /// Panics if `feature` does not fit in 31 bits.
    pub fn split(
        parent: i32,
        left: i32,
        right: i32,
        feature: u32,
        threshold: f32,
        default_left: bool,
    ) -> Self {
        assert!(feature <= SPLIT_INDEX_MASK, "split feature {feature} exceeds 31 bits");
        let mut sindex = feature;
        if default_left {
            sindex |= DEFAULT_LEFT_BIT;
        }
        Self::from_raw(parent, left, right, sindex as i32, threshold)
    }

    pub(crate) fn read<R: Read>(reader: &mut ModelReader<R>) -> Result<Self, ReadError> {
        let parent = reader.read_i32()?;
        let left = reader.read_i32()?;
        let right = reader.read_i32()?;
        let sindex = reader.read_i32()?;
        let value = reader.read_f32()?;
        Ok(Self::from_raw(parent, left, right, sindex, value))
    }

    /// Parent index; `-1` for a root.
    #[inline]
    pub fn parent(&self) -> i32 {
        self.parent
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.left
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.right
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Feature tested by this split.
    #[inline]
    pub fn split_index(&self) -> u32 {
        self.split_index
    }

    /// Whether a missing feature goes to the left child.
    #[inline]
    pub fn default_left(&self) -> bool {
        self.default_left
    }

    /// Child taken for a missing feature.
    #[inline]
    pub fn default_child(&self) -> i32 {
        if self.default_left { self.left } else { self.right }
    }

    /// Leaf value; NaN for internal nodes.
    #[inline]
    pub fn leaf_value(&self) -> f32 {
        if self.is_leaf { self.value } else { f32::NAN }
    }

    /// Split threshold; NaN for leaves.
    #[inline]
    pub fn split_cond(&self) -> f32 {
        if self.is_leaf { f32::NAN } else { self.value }
    }

    /// The packed split word as stored on disk.
    pub fn packed_split(&self) -> i32 {
        let mut word = self.split_index;
        if self.default_left {
            word |= DEFAULT_LEFT_BIT;
        }
        word as i32
    }

    /// The value word as stored on disk.
    pub fn raw_value(&self) -> f32 {
        self.value
    }
}

/// Per-node training statistics.
///
/// Decoded so the stream stays aligned; prediction never reads them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeStat {
    pub loss_chg: f32,
    pub sum_hess: f32,
    pub base_weight: f32,
    pub leaf_child_cnt: i32,
}

impl NodeStat {
    pub(crate) fn read<R: Read>(reader: &mut ModelReader<R>) -> Result<Self, ReadError> {
        Ok(Self {
            loss_chg: reader.read_f32()?,
            sum_hess: reader.read_f32()?,
            base_weight: reader.read_f32()?,
            leaf_child_cnt: reader.read_i32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_decoding() {
        let node = Node::from_raw(3, -1, -1, 0, 1.25);
        assert!(node.is_leaf());
        assert_eq!(node.leaf_value(), 1.25);
        assert!(node.split_cond().is_nan());
        assert_eq!(node.parent(), 3);
    }

    #[test]
    fn split_decoding_default_left() {
        let sindex = (DEFAULT_LEFT_BIT | 7) as i32;
        let node = Node::from_raw(-1, 1, 2, sindex, 0.5);
        assert!(!node.is_leaf());
        assert_eq!(node.split_index(), 7);
        assert!(node.default_left());
        assert_eq!(node.default_child(), 1);
        assert_eq!(node.split_cond(), 0.5);
        assert!(node.leaf_value().is_nan());
    }

    #[test]
    fn split_decoding_default_right() {
        let node = Node::from_raw(-1, 1, 2, 0x7fff_ffff, -3.0);
        assert_eq!(node.split_index(), 0x7fff_ffff);
        assert!(!node.default_left());
        assert_eq!(node.default_child(), 2);
    }

    #[test]
    fn packed_word_survives() {
        let node = Node::split(-1, 1, 2, 12, 0.5, true);
        assert_eq!(node.packed_split(), (DEFAULT_LEFT_BIT | 12) as i32);
        assert_eq!(node.raw_value(), 0.5);
        let again = Node::from_raw(-1, 1, 2, node.packed_split(), node.raw_value());
        assert_eq!(again, node);
    }

    #[test]
    fn read_node_and_stat() {
        let mut bytes = Vec::new();
        for word in [-1i32, 1, 2, i32::MIN | 3] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes.extend_from_slice(&0.75f32.to_le_bytes());
        for v in [1.0f32, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&4i32.to_le_bytes());

        let mut reader = ModelReader::new(&bytes[..]);
        let node = Node::read(&mut reader).unwrap();
        assert_eq!(node.split_index(), 3);
        assert!(node.default_left());
        assert_eq!(node.split_cond(), 0.75);

        let stat = NodeStat::read(&mut reader).unwrap();
        assert_eq!(stat.sum_hess, 2.0);
        assert_eq!(stat.leaf_child_cnt, 4);
        assert_eq!(reader.position(), 36);
    }
}
