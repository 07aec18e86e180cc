//! Truncated and corrupted streams.
//!
//! Offsets are computed from the section sizes of the binary layout so each
//! test cuts the stream at a known field.

use xgboost_predictor::io::ReadError;
use xgboost_predictor::testing::{ModelWriter, TestModel};
use xgboost_predictor::{LoadError, Predictor};

const FOREST_PARAM: usize = 4 * 4 + 8 + 4 * 2 + 31 * 4 + 4;
const TREE_PARAM: usize = 6 * 4 + 31 * 4;
const NODE: usize = 5 * 4;
const NODE_STAT: usize = 4 * 4;

fn header_len(model: &TestModel) -> usize {
    let mut writer = ModelWriter::new();
    writer.write_header(&model.header);
    writer.into_bytes().len()
}

fn load_err(bytes: &[u8]) -> ReadError {
    match Predictor::from_slice(bytes) {
        Err(LoadError::Read(err)) => err,
        Err(other) => panic!("expected a read error, got {other}"),
        Ok(_) => panic!("truncated stream loaded"),
    }
}

#[test]
fn complete_stream_layout() {
    let model = TestModel::single_split("reg:linear", 0.0);
    let bytes = ModelWriter::new().model(&model);
    // header + forest param + one tree of three nodes + tree_info
    let expected = header_len(&model) + FOREST_PARAM + TREE_PARAM + 3 * (NODE + NODE_STAT) + 4;
    assert_eq!(bytes.len(), expected);
}

#[test]
fn empty_stream() {
    assert!(matches!(
        load_err(&[]),
        ReadError::ShortRead {
            expected: 4,
            actual: 0
        }
    ));
}

#[test]
fn cut_inside_header_word() {
    let bytes = ModelWriter::new().model(&TestModel::single_split("reg:linear", 0.0));
    assert!(matches!(
        load_err(&bytes[..6]),
        ReadError::ShortRead {
            expected: 4,
            actual: 2
        }
    ));
}

#[test]
fn cut_inside_node() {
    let model = TestModel::single_split("reg:linear", 0.0);
    let bytes = ModelWriter::new().model(&model);
    // One byte into the `left` field of node 1.
    let node1 = header_len(&model) + FOREST_PARAM + TREE_PARAM + NODE;
    let cut = node1 + 4 + 1;

    assert!(matches!(
        load_err(&bytes[..cut]),
        ReadError::ShortRead {
            expected: 4,
            actual: 1
        }
    ));
}

#[test]
fn cut_inside_tree_info() {
    let bytes = ModelWriter::new().model(&TestModel::single_split("reg:linear", 0.0));
    assert!(matches!(
        load_err(&bytes[..bytes.len() - 1]),
        ReadError::ShortRead {
            expected: 4,
            actual: 3
        }
    ));
}

#[test]
fn cut_inside_prediction_buffer() {
    // One group, two entries, scalar leaves: 8 bytes per region.
    let bytes = ModelWriter::new().model(&TestModel::single_split("reg:linear", 0.0).with_pbuffer(2));
    assert!(Predictor::from_slice(&bytes).is_ok());

    assert!(matches!(
        load_err(&bytes[..bytes.len() - 3]),
        ReadError::ShortSkip {
            expected: 8,
            actual: 5
        }
    ));
    assert!(matches!(
        load_err(&bytes[..bytes.len() - 12]),
        ReadError::ShortSkip {
            expected: 8,
            actual: 4
        }
    ));
}

#[test]
fn cut_inside_linear_weights() {
    let bytes = ModelWriter::new().model(&TestModel::linear("reg:linear", 2, 1, vec![1.0, 2.0, 3.0]));
    assert!(matches!(
        load_err(&bytes[..bytes.len() - 2]),
        ReadError::ShortRead {
            expected: 12,
            actual: 10
        }
    ));
}

#[test]
fn negative_tree_count() {
    let model = TestModel::single_split("reg:linear", 0.0);
    let mut bytes = ModelWriter::new().model(&model);
    let at = header_len(&model);
    bytes[at..at + 4].copy_from_slice(&(-2i32).to_le_bytes());

    assert!(matches!(
        load_err(&bytes),
        ReadError::Overflow {
            what: "num_trees",
            value: -2
        }
    ));
}

#[test]
fn negative_string_length() {
    let model = TestModel::single_split("reg:linear", 0.0);
    let mut bytes = ModelWriter::new().model(&model);
    // Objective length prefix follows the 8-byte prefix, num_class, the
    // buffer flag and 30 reserved words.
    let at = 8 + 4 + 4 + 30 * 4;
    bytes[at..at + 8].copy_from_slice(&(-1i64).to_le_bytes());

    assert!(matches!(
        load_err(&bytes),
        ReadError::Overflow {
            what: "string length",
            value: -1
        }
    ));
}

#[test]
fn invalid_utf8_name() {
    let model = TestModel::single_split("reg:linear", 0.0);
    let mut bytes = ModelWriter::new().model(&model);
    let at = 8 + 4 + 4 + 30 * 4 + 8;
    bytes[at] = 0xff;

    assert!(matches!(load_err(&bytes), ReadError::InvalidString(_)));
}
