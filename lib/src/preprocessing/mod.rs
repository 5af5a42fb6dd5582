//! Data preprocessing transformers for the potability pipeline.
//!
//! Transformers follow the same type-state pattern as the classifier: an
//! unfitted transformer holds only hyperparameters, and `fit` returns a
//! separate fitted type holding the learned statistics.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! # Available Transformers
//!
//! - [`SimpleImputer`]: Fill missing values (NaN) with training-set column means
//! - [`StandardScaler`]: Z-score normalization with training-set mean and std
//!
//! Fitted transformers are never persisted on their own; their parameters are
//! embedded in the pipeline artifact (see [`crate::pipeline`]).
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use potability::preprocessing::{FittedTransformer, SimpleImputer, StandardScaler, Transformer};
//!
//! let data = array![[1.0, f64::NAN], [3.0, 4.0], [5.0, 6.0]];
//! let imputer = SimpleImputer::new().fit(&data)?;
//! let imputed = imputer.transform(&data)?;
//! let scaler = StandardScaler::new().fit(&imputed)?;
//! let scaled = scaler.transform(&imputed)?;
//! assert_eq!(scaled.dim(), (3, 2));
//! # Ok::<(), potability::preprocessing::PreprocessingError>(())
//! ```

pub mod error;
pub mod imputation;
pub mod scaling;
pub mod traits;

pub use error::PreprocessingError;
pub use imputation::{FittedSimpleImputer, SimpleImputer, SimpleImputerParams};
pub use scaling::{FittedStandardScaler, StandardScaler, StandardScalerConfig, StandardScalerParams};
pub use traits::{FittedTransformer, Transformer};
