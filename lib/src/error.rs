//! Errors surfaced at the crate boundary.
//!
//! `SchemaMismatch` is recoverable per request; `ArtifactLoad` and
//! `DatasetLoad` are fatal for the predictor and trainer respectively.

use crate::model::ModelError;
use crate::preprocessing::PreprocessingError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PotabilityError {
    /// Input rows do not match the nine-column feature schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The fitted pipeline artifact is absent, unreadable or corrupt.
    #[error("failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },

    /// The fitted pipeline artifact could not be written.
    #[error("failed to save artifact {path}: {reason}")]
    ArtifactSave { path: PathBuf, reason: String },

    /// The training dataset is absent, empty or malformed.
    #[error("failed to load dataset {origin}: {reason}")]
    DatasetLoad { origin: String, reason: String },

    #[error("preprocessing error: {0}")]
    Preprocessing(#[from] PreprocessingError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PotabilityError {
    /// Whether the caller can report this error and keep serving.
    pub fn is_input_error(&self) -> bool {
        matches!(self, PotabilityError::SchemaMismatch(_))
    }

    pub(crate) fn dataset(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        PotabilityError::DatasetLoad {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn artifact_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PotabilityError::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
