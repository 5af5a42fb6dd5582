//! Stateless prediction over a loaded [`FittedPipeline`].
//!
//! Two entry points share one pipeline: [`Predictor::predict_one`] for a
//! complete [`FeatureRow`] and [`Predictor::predict_batch`] for a
//! [`FeatureTable`] whose cells may be missing. Input is validated before any
//! transformer runs.

use crate::dataset::FeatureTable;
use crate::error::PotabilityError;
use crate::pipeline::FittedPipeline;
use crate::schema::{FeatureRow, Potability, N_FEATURES};
use ndarray::Array2;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Label and probability for one input row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BatchPrediction {
    pub label: Potability,
    /// Positive class probability.
    pub probability: f64,
}

impl BatchPrediction {
    fn from_probability(probability: f64) -> Self {
        Self {
            label: Potability::from_probability(probability),
            probability,
        }
    }

    /// Human-readable label, as written to the `Prediction` column.
    pub fn annotation(&self) -> &'static str {
        self.label.annotation()
    }
}

/// Read-only predictor; share it behind an `Arc` for concurrent use.
#[derive(Clone, Debug)]
pub struct Predictor {
    pipeline: FittedPipeline,
}

impl Predictor {
    pub fn new(pipeline: FittedPipeline) -> Self {
        Self { pipeline }
    }

    /// Load the artifact at `path`. Any failure is an `ArtifactLoad` error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PotabilityError> {
        FittedPipeline::load(path).map(Self::new)
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    /// Positive class probability for one complete row.
    pub fn predict_proba_one(&self, row: &FeatureRow) -> Result<f64, PotabilityError> {
        row.validate()?;
        let x = Array2::from_shape_vec((1, N_FEATURES), row.to_values().to_vec())
            .map_err(|e| PotabilityError::SchemaMismatch(e.to_string()))?;
        let probs = self.pipeline.predict_proba(&x)?;
        probs
            .first()
            .copied()
            .ok_or_else(|| PotabilityError::SchemaMismatch("no prediction produced".to_string()))
    }

    /// Classify one complete row; every field must be finite.
    pub fn predict_one(&self, row: &FeatureRow) -> Result<Potability, PotabilityError> {
        let probability = self.predict_proba_one(row)?;
        let label = Potability::from_probability(probability);
        debug!(probability, %label, "single-row prediction");
        Ok(label)
    }

    /// One prediction per table row, in input order. Missing cells are
    /// imputed with training means; an empty table gives an empty result.
    pub fn predict_batch(
        &self,
        table: &FeatureTable,
    ) -> Result<Vec<BatchPrediction>, PotabilityError> {
        if table.is_empty() {
            return Ok(Vec::new());
        }
        let probs = self.pipeline.predict_proba(table.features())?;
        debug!(rows = table.len(), "batch prediction");
        Ok(probs
            .iter()
            .map(|&p| BatchPrediction::from_probability(p))
            .collect())
    }
}
