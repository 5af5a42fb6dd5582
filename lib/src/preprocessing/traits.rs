//! Core traits for preprocessing transformers.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; has hyperparameters and can learn from data.
//! - [`FittedTransformer`]: After fitting; ready for inference and serialization.

use crate::preprocessing::error::PreprocessingError;
use crate::serialization::SerializableParams;
use ndarray::Array2;

/// Trait for unfitted transformers with hyperparameters.
///
/// A transformer learns parameters from training data (rows = samples,
/// columns = features) and returns a fitted transformer holding them.
pub trait Transformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params>;

    /// Fit the transformer to the training data.
    ///
    /// # Errors
    /// Returns [`PreprocessingError`] if the data is empty or contains values
    /// the transformer cannot learn from.
    fn fit(&self, data: &Array2<f64>) -> Result<Self::Fitted, PreprocessingError>;

    /// Fit the transformer and transform the same data in one step.
    fn fit_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError> {
        let fitted = self.fit(data)?;
        fitted.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `transform` never refits: it only applies the learned parameters.
pub trait FittedTransformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform data using learned parameters.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::FeatureMismatch`] if the column count
    /// differs from the one seen during fit.
    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError>;

    /// Reverse the transformation, if supported.
    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>
    where
        Self: Sized;

    /// Returns the number of features seen during fit.
    fn n_features_in(&self) -> usize;

    /// Check that `data` has the column count seen during fit.
    fn check_n_features(&self, data: &Array2<f64>) -> Result<(), PreprocessingError> {
        let got_features = data.ncols();
        if got_features != self.n_features_in() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features_in(),
                got_features,
            });
        }
        Ok(())
    }
}
