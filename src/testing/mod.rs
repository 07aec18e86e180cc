//! Testing utilities.
//!
//! [`ModelWriter`] encodes model descriptions into the exact byte layout the
//! loader reads, so unit tests, integration tests and benchmarks build their
//! inputs in-process instead of shipping binary fixtures.
//!
//! ```
//! use xgboost_predictor::model::Predictor;
//! use xgboost_predictor::testing::{ModelWriter, TestModel};
//!
//! let model = TestModel::multiclass("multi:softprob", &[0.0, 0.0]);
//! let predictor = Predictor::from_slice(&ModelWriter::new().model(&model)).unwrap();
//! assert_eq!(predictor.n_groups(), 2);
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::model::{HeaderFormat, LegacyMarker};
use crate::repr::gbdt::{Node, NodeStat};

// =============================================================================
// Model descriptions
// =============================================================================

/// Header fields as they will be written.
#[derive(Debug, Clone)]
pub struct TestHeader {
    pub format: HeaderFormat,
    pub base_score: f32,
    pub num_feature: i32,
    pub num_class: i32,
    pub saved_with_pbuffer: i32,
    pub objective: String,
    pub booster: String,
}

/// One tree section.
#[derive(Debug, Clone)]
pub struct TestTree {
    pub num_roots: i32,
    pub max_depth: i32,
    pub nodes: Vec<Node>,
    pub stats: Vec<NodeStat>,
}

impl TestTree {
    /// Single-root tree with zeroed statistics.
    pub fn new(nodes: Vec<Node>) -> Self {
        let stats = vec![NodeStat::default(); nodes.len()];
        Self {
            num_roots: 1,
            max_depth: 0,
            nodes,
            stats,
        }
    }

    /// A single leaf.
    pub fn leaf(value: f32) -> Self {
        Self::new(vec![Node::leaf(-1, value)])
    }

    /// `feature < threshold ? left : right`, missing goes left.
    pub fn stump(feature: u32, threshold: f32, left: f32, right: f32) -> Self {
        let mut tree = Self::new(vec![
            Node::split(-1, 1, 2, feature, threshold, true),
            Node::leaf(0, left),
            Node::leaf(0, right),
        ]);
        tree.max_depth = 1;
        tree
    }
}

/// Tree-ensemble section.
#[derive(Debug, Clone)]
pub struct TestForest {
    pub num_roots: i32,
    pub num_feature: i32,
    pub num_pbuffer: i64,
    pub num_output_group: i32,
    pub size_leaf_vector: i32,
    pub trees: Vec<TestTree>,
    pub tree_info: Vec<i32>,
}

/// Linear section; `weights` includes the bias row.
#[derive(Debug, Clone)]
pub struct TestLinear {
    pub num_feature: i32,
    pub num_output_group: i32,
    pub weights: Vec<f32>,
}

#[derive(Debug, Clone)]
pub enum TestBooster {
    Tree(TestForest),
    Linear(TestLinear),
}

/// A complete model stream.
#[derive(Debug, Clone)]
pub struct TestModel {
    pub header: TestHeader,
    pub booster: TestBooster,
    /// Bytes appended after the booster section.
    pub trailing: Vec<u8>,
}

impl TestModel {
    fn header(objective: &str, booster: &str, base_score: f32) -> TestHeader {
        TestHeader {
            format: HeaderFormat::Bare,
            base_score,
            num_feature: 1,
            num_class: 0,
            saved_with_pbuffer: 0,
            objective: objective.to_string(),
            booster: booster.to_string(),
        }
    }

    /// Tree ensemble from trees and their group assignment.
    pub fn forest(
        objective: &str,
        base_score: f32,
        trees: Vec<TestTree>,
        tree_info: Vec<i32>,
        num_output_group: i32,
    ) -> Self {
        Self {
            header: Self::header(objective, "gbtree", base_score),
            booster: TestBooster::Tree(TestForest {
                num_roots: 1,
                num_feature: 1,
                num_pbuffer: 0,
                num_output_group,
                size_leaf_vector: 0,
                trees,
                tree_info,
            }),
            trailing: Vec::new(),
        }
    }

    /// One stump on feature 0: `x < 0.5 → -1.0`, else `2.0`, missing left.
    pub fn single_split(objective: &str, base_score: f32) -> Self {
        Self::forest(
            objective,
            base_score,
            vec![TestTree::stump(0, 0.5, -1.0, 2.0)],
            vec![0],
            1,
        )
    }

    /// One single-leaf tree.
    pub fn constant(objective: &str, value: f32, base_score: f32) -> Self {
        Self::forest(objective, base_score, vec![TestTree::leaf(value)], vec![0], 1)
    }

    /// One single-leaf tree per class, carrying that class's margin.
    pub fn multiclass(objective: &str, margins: &[f32]) -> Self {
        let trees = margins.iter().map(|&m| TestTree::leaf(m)).collect();
        let tree_info = (0..margins.len() as i32).collect();
        let mut model = Self::forest(objective, 0.0, trees, tree_info, margins.len() as i32);
        model.header.num_class = margins.len() as i32;
        model
    }

    /// Linear model; `weights` is `(num_feature + 1) * num_output_group` long.
    pub fn linear(objective: &str, num_feature: i32, num_output_group: i32, weights: Vec<f32>) -> Self {
        let mut header = Self::header(objective, "gblinear", 0.0);
        header.num_feature = num_feature;
        Self {
            header,
            booster: TestBooster::Linear(TestLinear {
                num_feature,
                num_output_group,
                weights,
            }),
            trailing: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: HeaderFormat) -> Self {
        self.header.format = format;
        self
    }

    pub fn with_base_score(mut self, base_score: f32) -> Self {
        self.header.base_score = base_score;
        self
    }

    /// Mark the stream as carrying a prediction buffer of `num_pbuffer`
    /// entries and append the two regions after the trees.
    ///
    /// No effect on linear models.
    pub fn with_pbuffer(mut self, num_pbuffer: i64) -> Self {
        self.header.saved_with_pbuffer = 1;
        if let TestBooster::Tree(forest) = &mut self.booster {
            forest.num_pbuffer = num_pbuffer;
        }
        self
    }
}

// =============================================================================
// ModelWriter
// =============================================================================

/// Little-endian encoder for the legacy binary model layout.
#[derive(Debug, Default)]
pub struct ModelWriter {
    buf: Vec<u8>,
}

impl ModelWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Encode a complete model.
    pub fn model(mut self, model: &TestModel) -> Vec<u8> {
        self.write_header(&model.header);
        match &model.booster {
            TestBooster::Tree(forest) => {
                let pbuffer = model.header.saved_with_pbuffer != 0;
                self.write_forest(forest, pbuffer);
            }
            TestBooster::Linear(linear) => {
                self.write_linear(linear);
            }
        }
        self.write_bytes(&model.trailing);
        self.buf
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        let mut word = [0u8; 4];
        LittleEndian::write_i32(&mut word, v);
        self.write_bytes(&word)
    }

    pub fn write_i64(&mut self, v: i64) -> &mut Self {
        let mut word = [0u8; 8];
        LittleEndian::write_i64(&mut word, v);
        self.write_bytes(&word)
    }

    pub fn write_f32(&mut self, v: f32) -> &mut Self {
        let mut word = [0u8; 4];
        LittleEndian::write_f32(&mut word, v);
        self.write_bytes(&word)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// 64-bit length prefix followed by the bytes.
    pub fn write_string(&mut self, s: &str) -> &mut Self {
        self.write_i64(s.len() as i64).write_bytes(s.as_bytes())
    }

    fn write_zeros(&mut self, words: usize) -> &mut Self {
        self.buf.resize(self.buf.len() + words * 4, 0);
        self
    }

    // =========================================================================
    // Sections
    // =========================================================================

    pub fn write_header(&mut self, header: &TestHeader) -> &mut Self {
        match &header.format {
            HeaderFormat::Binf => {
                self.write_bytes(b"binf")
                    .write_f32(header.base_score)
                    .write_i32(header.num_feature);
            }
            HeaderFormat::Legacy { marker, model_type } => {
                let tag: &[u8; 4] = match marker {
                    LegacyMarker::Classification => b"cls_",
                    LegacyMarker::Regression => b"reg_",
                };
                let len = model_type.len();
                self.write_bytes(&[0, 5, b'_'])
                    .write_bytes(tag)
                    .write_u8((len >> 8) as u8)
                    .write_u8(len as u8)
                    .write_bytes(model_type.as_bytes())
                    .write_f32(header.base_score)
                    .write_i32(header.num_feature);
            }
            HeaderFormat::Bare => {
                self.write_f32(header.base_score).write_i32(header.num_feature);
            }
        }
        self.write_i32(header.num_class)
            .write_i32(header.saved_with_pbuffer)
            .write_zeros(30)
            .write_string(&header.objective)
            .write_string(&header.booster)
    }

    pub fn write_node(&mut self, node: &Node) -> &mut Self {
        self.write_i32(node.parent())
            .write_i32(node.left())
            .write_i32(node.right())
            .write_i32(node.packed_split())
            .write_f32(node.raw_value())
    }

    pub fn write_tree(&mut self, tree: &TestTree) -> &mut Self {
        self.write_i32(tree.num_roots)
            .write_i32(tree.nodes.len() as i32)
            .write_i32(0)
            .write_i32(tree.max_depth)
            .write_i32(1)
            .write_i32(0)
            .write_zeros(31);
        for node in &tree.nodes {
            self.write_node(node);
        }
        for stat in &tree.stats {
            self.write_f32(stat.loss_chg)
                .write_f32(stat.sum_hess)
                .write_f32(stat.base_weight)
                .write_i32(stat.leaf_child_cnt);
        }
        self
    }

    /// Tree-ensemble section; with `pbuffer`, appends the two buffer regions.
    pub fn write_forest(&mut self, forest: &TestForest, pbuffer: bool) -> &mut Self {
        self.write_i32(forest.trees.len() as i32)
            .write_i32(forest.num_roots)
            .write_i32(forest.num_feature)
            .write_i32(0)
            .write_i64(forest.num_pbuffer)
            .write_i32(forest.num_output_group)
            .write_i32(forest.size_leaf_vector)
            .write_zeros(31)
            .write_i32(0);
        for tree in &forest.trees {
            self.write_tree(tree);
        }
        if !forest.trees.is_empty() {
            for &group in &forest.tree_info {
                self.write_i32(group);
            }
        }
        if pbuffer && forest.num_pbuffer > 0 {
            let words = forest.num_output_group as usize
                * forest.num_pbuffer as usize
                * (forest.size_leaf_vector as usize + 1);
            // Non-zero filler so a skipped region that gets decoded shows up.
            for _ in 0..2 * words {
                self.write_f32(f32::NAN);
            }
        }
        self
    }

    pub fn write_linear(&mut self, linear: &TestLinear) -> &mut Self {
        self.write_i32(linear.num_feature)
            .write_i32(linear.num_output_group)
            .write_zeros(32)
            .write_i32(0);
        for &w in &linear.weights {
            self.write_f32(w);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_sizes() {
        let model = TestModel::constant("reg:linear", 1.0, 0.0);
        let header = &model.header;

        let mut bare = ModelWriter::new();
        bare.write_header(header);
        // 8 + num_class + pbuffer + 30 reserved + two strings
        assert_eq!(bare.into_bytes().len(), 8 + 4 + 4 + 120 + 8 + 10 + 8 + 6);

        let mut legacy = ModelWriter::new();
        legacy.write_header(&TestHeader {
            format: HeaderFormat::Legacy {
                marker: LegacyMarker::Regression,
                model_type: "abc".to_string(),
            },
            ..header.clone()
        });
        let bytes = legacy.into_bytes();
        assert_eq!(&bytes[..9], &[0, 5, b'_', b'r', b'e', b'g', b'_', 0, 3]);
        assert_eq!(&bytes[9..12], b"abc");
    }

    #[test]
    fn legacy_classification_marker() {
        let mut writer = ModelWriter::new();
        writer.write_header(&TestHeader {
            format: HeaderFormat::Legacy {
                marker: LegacyMarker::Classification,
                model_type: "x".repeat(258),
            },
            ..TestModel::constant("reg:linear", 1.0, 0.0).header
        });
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..9], &[0, 5, b'_', b'c', b'l', b's', b'_', 1, 2]);
    }

    #[test]
    fn linear_model_layout() {
        let model = TestModel::linear("reg:linear", 2, 1, vec![1.0, 2.0, 3.0]);
        let mut header = ModelWriter::new();
        header.write_header(&model.header);
        let header_len = header.into_bytes().len();

        let bytes = ModelWriter::new().model(&model);
        // num_feature + num_output_group + 32 reserved + ignored word + weights
        assert_eq!(bytes.len(), header_len + 2 * 4 + 32 * 4 + 4 + 3 * 4);
        assert_eq!(&bytes[bytes.len() - 4..], &3.0f32.to_le_bytes());
    }

    #[test]
    fn node_layout() {
        let mut writer = ModelWriter::new();
        writer.write_node(&Node::split(-1, 1, 2, 3, 0.5, true));
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[12..16], &(i32::MIN | 3).to_le_bytes());
        assert_eq!(&bytes[16..], &0.5f32.to_le_bytes());
    }
}
