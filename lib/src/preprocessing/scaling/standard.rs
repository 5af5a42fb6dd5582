//! Standard Scaler (Z-score normalization).
//!
//! Transforms features by removing the mean and scaling to unit variance.
//!
//! The standard score of a sample `x` is calculated as:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the mean of the training samples, and `s` is the population
//! standard deviation (ddof = 0). Constant features get `s = 1`.
//!
//! # Example
//! ```
//! use ndarray::array;
//! use potability::preprocessing::{FittedTransformer, StandardScaler, Transformer};
//!
//! let data = array![[0.0, 1.0], [0.0, 1.0], [1.0, 3.0]];
//! let fitted = StandardScaler::new().fit(&data)?;
//! let scaled = fitted.transform(&data)?;
//! assert!(scaled.column(0).sum().abs() < 1e-12);
//! # Ok::<(), potability::preprocessing::PreprocessingError>(())
//! ```

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Configuration for StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerConfig {
    /// If true, center the data before scaling.
    pub with_mean: bool,
    /// If true, scale the data to unit variance.
    pub with_std: bool,
}

impl Default for StandardScalerConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Configuration options.
    pub config: StandardScalerConfig,
    /// Mean of each feature (zeros if `with_mean` is false).
    pub mean: Vec<f64>,
    /// Standard deviation of each feature (ones if `with_std` is false).
    pub std: Vec<f64>,
    /// Number of features seen during fit.
    pub n_features: usize,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler {
    config: StandardScalerConfig,
}

impl StandardScaler {
    /// Create a new StandardScaler with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to center data by mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.config.with_mean = with_mean;
        self
    }

    /// Set whether to scale data to unit variance.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.config.with_std = with_std;
        self
    }
}

impl Transformer for StandardScaler {
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Array2<f64>) -> Result<Self::Fitted, PreprocessingError> {
        let (rows, cols) = data.dim();

        if rows == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }
        if let Some(col) = data
            .axis_iter(Axis(1))
            .position(|column| column.iter().any(|v| v.is_nan()))
        {
            return Err(PreprocessingError::MissingValues(format!(
                "column {col} contains NaN; impute before scaling"
            )));
        }

        let mean = if self.config.with_mean {
            data.mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(cols))
        } else {
            Array1::zeros(cols)
        };

        // Constant features keep unit scale.
        let std = if self.config.with_std {
            data.std_axis(Axis(0), 0.0)
                .mapv(|s| if s == 0.0 { 1.0 } else { s })
        } else {
            Array1::ones(cols)
        };

        Ok(FittedStandardScaler {
            config: self.config.clone(),
            mean,
            std,
        })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug)]
pub struct FittedStandardScaler {
    config: StandardScalerConfig,
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl FittedStandardScaler {
    /// Get the mean values for each feature.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Get the standard deviation values for each feature.
    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Params = StandardScalerParams;

    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError> {
        self.check_n_features(data)?;

        let mut result = data.clone();
        if self.config.with_mean {
            result -= &self.mean;
        }
        if self.config.with_std {
            result /= &self.std;
        }
        Ok(result)
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError> {
        self.check_n_features(data)?;

        let mut result = data.clone();
        if self.config.with_std {
            result *= &self.std;
        }
        if self.config.with_mean {
            result += &self.mean;
        }
        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        StandardScalerParams {
            config: self.config.clone(),
            mean: self.mean.to_vec(),
            std: self.std.to_vec(),
            n_features: self.mean.len(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.mean.len() != params.n_features || params.std.len() != params.n_features {
            return Err(PreprocessingError::SerializationError(format!(
                "scaler has {} means and {} stds for {} features",
                params.mean.len(),
                params.std.len(),
                params.n_features
            )));
        }
        if params.std.iter().any(|&s| !s.is_finite() || s <= 0.0)
            || params.mean.iter().any(|m| !m.is_finite())
        {
            return Err(PreprocessingError::SerializationError(
                "scaler statistics must be finite with positive std".to_string(),
            ));
        }

        Ok(Self {
            config: params.config,
            mean: Array1::from(params.mean),
            std: Array1::from(params.std),
        })
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }
}
