//! Model orchestrator.
//!
//! [`Predictor`] decodes the header, resolves the objective and booster by
//! name, then lets the booster consume the rest of the stream from the same
//! cursor. After construction nothing is mutated, so a `Predictor` can be
//! shared across threads by reference.
//!
//! Every prediction computes `booster output + base_score` per group, then
//! applies the transform unless a raw margin was requested.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use ndarray::{Array2, ArrayView2};
use tracing::{debug, warn};

use super::{
    Booster, BoosterKind, LoadError, ModelHeader, OutputTransform, PredictError, PredictOptions,
    PredictorConfig,
};
use crate::data::{DenseFeatures, FeatureVector};
use crate::io::{ModelReader, ReadError};
use crate::math::ExpBackend;
use crate::repr::gbdt::NodeId;

/// A loaded model ready for prediction.
///
/// # Example
///
/// ```
/// use xgboost_predictor::model::{Predictor, PredictOptions};
/// use xgboost_predictor::testing::{ModelWriter, TestModel};
///
/// let bytes = ModelWriter::new().model(&TestModel::single_split("binary:logistic", 0.0));
/// let predictor = Predictor::from_slice(&bytes).unwrap();
///
/// let p = predictor.predict(&[0.7f32][..], PredictOptions::default()).unwrap();
/// assert!(p[0] > 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Predictor {
    header: ModelHeader,
    transform: OutputTransform,
    exp: ExpBackend,
    booster: Booster,
}

impl Predictor {
    // =========================================================================
    // Loading
    // =========================================================================

    /// Load with the default configuration.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::from_reader_with_config(reader, &PredictorConfig::default())
    }

    /// Load, resolving the objective through `config`.
    pub fn from_reader_with_config<R: Read>(
        reader: R,
        config: &PredictorConfig,
    ) -> Result<Self, LoadError> {
        let mut reader = ModelReader::new(reader);
        let header = ModelHeader::read(&mut reader)?;

        let transform = match config.objective {
            Some(transform) => transform,
            None => config.registry.resolve(&header.objective)?,
        };
        let kind = BoosterKind::from_name(&header.booster)?;
        let booster = Booster::read(kind, &mut reader, header.saved_with_pbuffer)?;

        let n_groups = booster.n_groups();
        if header.num_class > 0 && header.num_class as usize != n_groups {
            warn!(
                num_class = header.num_class,
                n_groups, "header class count disagrees with booster output groups"
            );
        }
        debug!(
            booster = %kind,
            transform = transform.name(),
            n_groups,
            bytes = reader.position(),
            "loaded model"
        );

        Ok(Self {
            header,
            transform,
            exp: config.exp_backend,
            booster,
        })
    }

    /// Load from an in-memory buffer.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::from_reader(bytes)
    }

    /// Load from a file with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::open_with_config(path, &PredictorConfig::default())
    }

    /// Load from a file.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: &PredictorConfig,
    ) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(ReadError::from)?;
        Self::from_reader_with_config(BufReader::new(file), config)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    #[inline]
    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    #[inline]
    pub fn base_score(&self) -> f32 {
        self.header.base_score
    }

    #[inline]
    pub fn transform(&self) -> OutputTransform {
        self.transform
    }

    #[inline]
    pub fn exp_backend(&self) -> ExpBackend {
        self.exp
    }

    #[inline]
    pub fn booster(&self) -> &Booster {
        &self.booster
    }

    #[inline]
    pub fn n_groups(&self) -> usize {
        self.booster.n_groups()
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Per-group margins: booster output plus base score.
    pub fn predict_margin<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        options: PredictOptions,
    ) -> Result<Vec<f32>, PredictError> {
        let mut margins = self
            .booster
            .predict(features, options.root_index, options.ntree_limit)?;
        for m in margins.iter_mut() {
            *m += self.header.base_score;
        }
        Ok(margins)
    }

    /// Per-group predictions, transformed unless `options.output_margin`.
    pub fn predict<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        options: PredictOptions,
    ) -> Result<Vec<f32>, PredictError> {
        let margins = self.predict_margin(features, options)?;
        if options.output_margin {
            Ok(margins)
        } else {
            Ok(self.transform.transform(margins, self.exp))
        }
    }

    /// Prediction of a single-output model.
    ///
    /// Fails with [`PredictError::NotSingleOutput`] unless the model has
    /// exactly one output group. Trees start from root 0 regardless of
    /// `options.root_index`.
    pub fn predict_single<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        options: PredictOptions,
    ) -> Result<f32, PredictError> {
        let margin =
            self.booster.predict_single(features, options.ntree_limit)? + self.header.base_score;
        if options.output_margin {
            Ok(margin)
        } else {
            self.transform.transform_single(margin, self.exp)
        }
    }

    /// Leaf reached in each of the first `ntree_limit` trees (0 = all).
    pub fn predict_leaf<F: FeatureVector + ?Sized>(
        &self,
        features: &F,
        ntree_limit: usize,
    ) -> Result<Vec<NodeId>, PredictError> {
        self.booster.predict_leaf(features, ntree_limit)
    }

    /// Number of values [`predict`](Self::predict) returns per row.
    pub fn output_width(&self, options: PredictOptions) -> usize {
        let n_groups = self.n_groups();
        match self.transform {
            OutputTransform::SoftmaxArgmax if !options.output_margin => n_groups.min(1),
            _ => n_groups,
        }
    }

    /// Predict every row of a dense matrix, one row at a time.
    ///
    /// NaN cells are missing; with `zero_as_missing` exact zeros are too.
    pub fn predict_rows(
        &self,
        rows: ArrayView2<'_, f32>,
        zero_as_missing: bool,
        options: PredictOptions,
    ) -> Result<Array2<f32>, PredictError> {
        let mut output = Array2::zeros((rows.nrows(), self.output_width(options)));
        let mut buffer = Vec::with_capacity(rows.ncols());

        for (row, mut out) in rows.outer_iter().zip(output.outer_iter_mut()) {
            buffer.clear();
            buffer.extend(row.iter().copied());
            let features = DenseFeatures::new(&buffer[..]).zero_as_missing(zero_as_missing);
            let preds = self.predict(&features, options)?;
            for (dst, src) in out.iter_mut().zip(preds) {
                *dst = src;
            }
        }

        Ok(output)
    }
}
