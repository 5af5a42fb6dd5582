//! Simple Imputer.
//!
//! Replaces missing values with the mean of each column, computed over the
//! non-missing training values.
//!
//! Note: NaN is the missing-value marker. A column that is entirely missing
//! during fit imputes 0.
//!
//! # Example
//! ```
//! use ndarray::array;
//! use potability::preprocessing::{FittedTransformer, SimpleImputer, Transformer};
//!
//! let data = array![[1.0, f64::NAN], [3.0, 4.0], [5.0, 6.0]];
//! let fitted = SimpleImputer::new().fit(&data)?;
//! let imputed = fitted.transform(&data)?;
//! assert_eq!(imputed[[0, 1]], 5.0);
//! # Ok::<(), potability::preprocessing::PreprocessingError>(())
//! ```

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Serializable parameters for a fitted SimpleImputer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpleImputerParams {
    /// Fill value (training mean) for each feature.
    pub statistics: Vec<f64>,
    /// Number of features seen during fit.
    pub n_features: usize,
}

/// SimpleImputer transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct SimpleImputer;

impl SimpleImputer {
    /// Create a new mean imputer.
    pub fn new() -> Self {
        Self
    }
}

/// Mean of the non-NaN values of each column.
fn column_means_ignoring_nan(data: &Array2<f64>) -> Array1<f64> {
    data.axis_iter(Axis(1))
        .map(|column| {
            let (sum, count) = column
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
            if count == 0 {
                0.0
            } else {
                sum / count as f64
            }
        })
        .collect()
}

impl Transformer for SimpleImputer {
    type Params = SimpleImputerParams;
    type Fitted = FittedSimpleImputer;

    fn fit(&self, data: &Array2<f64>) -> Result<Self::Fitted, PreprocessingError> {
        if data.nrows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit SimpleImputer on empty data".to_string(),
            ));
        }

        Ok(FittedSimpleImputer {
            statistics: column_means_ignoring_nan(data),
        })
    }
}

/// Fitted SimpleImputer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedSimpleImputer {
    statistics: Array1<f64>,
}

impl FittedSimpleImputer {
    /// The fill value for each feature.
    pub fn statistics(&self) -> &Array1<f64> {
        &self.statistics
    }
}

impl FittedTransformer for FittedSimpleImputer {
    type Params = SimpleImputerParams;

    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError> {
        self.check_n_features(data)?;

        let mut result = data.clone();
        for (mut column, &fill) in result.axis_iter_mut(Axis(1)).zip(self.statistics.iter()) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        Ok(result)
    }

    fn inverse_transform(&self, _data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError> {
        Err(PreprocessingError::InvalidParameter(
            "SimpleImputer does not support inverse_transform (missing value information is lost)"
                .to_string(),
        ))
    }

    fn extract_params(&self) -> Self::Params {
        SimpleImputerParams {
            statistics: self.statistics.to_vec(),
            n_features: self.statistics.len(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.statistics.len() != params.n_features {
            return Err(PreprocessingError::SerializationError(format!(
                "imputer has {} statistics for {} features",
                params.statistics.len(),
                params.n_features
            )));
        }
        if params.statistics.iter().any(|s| !s.is_finite()) {
            return Err(PreprocessingError::SerializationError(
                "imputer statistics must be finite".to_string(),
            ));
        }
        Ok(Self {
            statistics: Array1::from(params.statistics),
        })
    }

    fn n_features_in(&self) -> usize {
        self.statistics.len()
    }
}
