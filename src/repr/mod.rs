//! Decoded model representations.
//!
//! - [`gbdt`]: decision-tree ensembles
//! - [`gblinear`]: linear models

pub mod gbdt;
pub mod gblinear;
