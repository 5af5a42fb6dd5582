//! Models with compile-time training state.
//!
//! - [`GradientBoostingClassifier<Unfitted>`] holds hyperparameters and can only be fitted.
//! - [`GradientBoostingClassifier<Fitted>`] holds the tree ensemble and can only predict.

pub mod gbdt;
pub mod state;
pub mod tree;

pub use gbdt::{BoostingConfig, GbdtParams, GradientBoostingClassifier};
pub use state::{Fitted, Unfitted};
pub use tree::{Node, RegressionTree};

use thiserror::Error;

/// Inference over single samples and batches.
pub trait InferenceModel {
    type InputSingle: ?Sized;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;

    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle;
    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch;
}

/// Errors raised while fitting or restoring a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid hyperparameter: {0}")]
    InvalidConfig(String),

    #[error("cannot fit on empty data")]
    EmptyData,

    #[error("{rows} feature rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("label at row {row} must be 0 or 1, got {value}")]
    InvalidLabel { row: usize, value: f64 },

    #[error("feature values must be finite; found {value} at row {row}, column {column}")]
    NonFiniteFeature { row: usize, column: usize, value: f64 },

    #[error("expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("corrupt model: {0}")]
    Corrupt(String),
}
