//! # potability
//!
//! Predicts whether a water sample is safe to drink from nine water-quality
//! measurements, using an impute → scale → gradient-boost pipeline with strict
//! separation between training and inference.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: Transformers and the classifier carry their
//!   training state in the type system (`Unfitted` vs `Fitted`), so nothing can
//!   predict before it has been fitted.
//! - **One Artifact**: The fitted imputer, scaler and classifier are bundled into
//!   a single [`FittedPipeline`] and persisted as one file. Inference always uses
//!   the statistics learned at training time.
//! - **Eager Validation**: Column names, column count and cell values are checked
//!   before any transformer runs; malformed input is a
//!   [`PotabilityError::SchemaMismatch`], never a panic.
//!
//! ## Quick Start
//!
//! ```no_run
//! use potability::dataset::LabeledDataset;
//! use potability::predictor::Predictor;
//! use potability::schema::FeatureRow;
//! use potability::trainer::Trainer;
//!
//! # fn main() -> Result<(), potability::PotabilityError> {
//! let dataset = LabeledDataset::from_csv_path("df/water_potability.csv")?;
//! let outcome = Trainer::builder().seed(42).test_size(0.2).build().fit(&dataset)?;
//! outcome.pipeline.save("improved_xgboost_model.bin")?;
//!
//! let predictor = Predictor::load("improved_xgboost_model.bin")?;
//! let label = predictor.predict_one(&FeatureRow::default())?;
//! println!("{label}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `schema`: the nine feature columns, [`FeatureRow`] and the [`Potability`] label
//! - `dataset`: CSV loading for labeled datasets and prediction tables, seeded splits
//! - `preprocessing`: mean imputation and standardization transformers
//! - `loss`: logistic loss, its gradient and hessian
//! - `model`: gradient-boosted decision trees
//! - `pipeline`: the bundled fitted pipeline and its artifact format
//! - `trainer`: fits the pipeline on a train/holdout split
//! - `predictor`: single-row and batch prediction entry points
//! - `metrics`: holdout accuracy and log-loss

/// Feature schema shared by training and prediction.
pub mod schema;

/// Error type returned at the crate boundary.
pub mod error;

/// Labeled datasets, prediction tables and seeded splitting.
pub mod dataset;

/// Data preprocessing transformers.
pub mod preprocessing;

/// Logistic loss used by the boosting objective.
pub mod loss;

/// Machine learning models with compile-time state safety.
pub mod model;

/// Fitted pipeline bundle and artifact persistence.
pub mod pipeline;

/// Training orchestration.
pub mod trainer;

/// Stateless prediction over a loaded artifact.
pub mod predictor;

/// Classification metrics for holdout reporting.
pub mod metrics;

/// Parameter (de)serialization.
pub mod serialization;

pub use error::PotabilityError;
pub use pipeline::FittedPipeline;
pub use predictor::{BatchPrediction, Predictor};
pub use schema::{FeatureRow, Potability, FEATURE_NAMES, LABEL_COLUMN};
