//! Training orchestration.
//!
//! The [`Trainer`] splits a labeled dataset into training and holdout rows,
//! fits the whole [`Pipeline`] on the training rows and scores the holdout
//! rows with the fitted result.

use crate::dataset::LabeledDataset;
use crate::error::PotabilityError;
use crate::metrics::Metrics;
use crate::model::BoostingConfig;
use crate::pipeline::{FittedPipeline, Pipeline};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything the trainer needs besides the data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Fraction of rows held out for evaluation.
    pub test_size: f64,
    /// Seed of the train/holdout shuffle.
    pub seed: u64,
    /// Ensemble hyperparameters.
    pub boosting: BoostingConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            boosting: BoostingConfig::default(),
        }
    }
}

/// Fits a [`FittedPipeline`] on a seeded train/holdout split.
///
/// Once built via [`TrainerBuilder`], it is immutable and can be reused
/// across datasets.
#[derive(Clone, Debug, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

/// Fluent builder for a [`Trainer`].
///
/// Defaults:
/// - `test_size`: 0.2
/// - `seed`: 42
/// - `n_estimators`: 100, `max_depth`: 3, `learning_rate`: 0.3
#[derive(Clone, Debug, Default)]
pub struct TrainerBuilder {
    config: TrainerConfig,
}

impl TrainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn test_size(mut self, test_size: f64) -> Self {
        self.config.test_size = test_size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.config.boosting.n_estimators = n_estimators;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.boosting.max_depth = max_depth;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.config.boosting.learning_rate = learning_rate;
        self
    }

    /// Replace all ensemble hyperparameters at once.
    pub fn boosting(mut self, boosting: BoostingConfig) -> Self {
        self.config.boosting = boosting;
        self
    }

    pub fn build(self) -> Trainer {
        Trainer {
            config: self.config,
        }
    }
}

/// Holdout evaluation of a freshly fitted pipeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_test: usize,
    pub holdout_accuracy: f64,
    pub holdout_log_loss: f64,
    /// Share of potable rows among the holdout labels.
    pub holdout_positive_rate: f64,
    /// Positive class probability of every holdout row, in split order.
    pub holdout_probabilities: Vec<f64>,
}

/// Result of [`Trainer::fit`].
#[derive(Clone, Debug)]
pub struct TrainingOutcome {
    pub pipeline: FittedPipeline,
    pub report: TrainingReport,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Convenience constructor that starts the builder pattern.
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::new()
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Split, fit on the training rows, evaluate on the holdout rows.
    ///
    /// The same dataset and configuration always produce the same pipeline
    /// and holdout predictions.
    pub fn fit(&self, dataset: &LabeledDataset) -> Result<TrainingOutcome, PotabilityError> {
        let (train, test) = dataset.train_test_split(self.config.test_size, self.config.seed)?;

        let pipeline = Pipeline::new(self.config.boosting.clone())
            .fit(train.features(), train.labels())?;

        let probabilities = pipeline.predict_proba(test.features())?.to_vec();
        let report = TrainingReport {
            n_train: train.len(),
            n_test: test.len(),
            holdout_accuracy: Metrics::accuracy(test.labels(), &probabilities),
            holdout_log_loss: Metrics::log_loss(test.labels(), &probabilities),
            holdout_positive_rate: Metrics::positive_rate(test.labels()),
            holdout_probabilities: probabilities,
        };

        info!(
            n_train = report.n_train,
            n_test = report.n_test,
            accuracy = report.holdout_accuracy,
            log_loss = report.holdout_log_loss,
            positive_rate = report.holdout_positive_rate,
            "holdout evaluation"
        );
        Ok(TrainingOutcome { pipeline, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::N_FEATURES;
    use ndarray::Array2;

    fn dataset(n: usize) -> LabeledDataset {
        // label depends on the first two features only
        let features = Array2::from_shape_fn((n, N_FEATURES), |(i, j)| match j {
            0 => (i % 10) as f64,
            1 => ((i * 7) % 13) as f64,
            _ => ((i * 31 + j * 17) % 23) as f64,
        });
        let labels = (0..n)
            .map(|i| f64::from((i % 10) + ((i * 7) % 13) > 10))
            .collect();
        LabeledDataset::new(features, labels).unwrap()
    }

    #[test]
    fn test_trainer_builder_default_values() {
        let trainer = Trainer::builder().build();
        assert_eq!(trainer.config(), &TrainerConfig::default());
        assert_eq!(trainer.config().seed, 42);
        assert_eq!(trainer.config().test_size, 0.2);
        assert_eq!(trainer.config().boosting.n_estimators, 100);
    }

    #[test]
    fn test_trainer_builder_chaining() {
        let trainer = Trainer::builder()
            .seed(7)
            .test_size(0.3)
            .n_estimators(12)
            .max_depth(2)
            .learning_rate(0.1)
            .build();

        let config = trainer.config();
        assert_eq!(config.seed, 7);
        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.boosting.n_estimators, 12);
        assert_eq!(config.boosting.max_depth, 2);
        assert_eq!(config.boosting.learning_rate, 0.1);
    }

    #[test]
    fn test_fit_reports_holdout() {
        let outcome = Trainer::builder()
            .n_estimators(30)
            .build()
            .fit(&dataset(200))
            .unwrap();

        let report = &outcome.report;
        assert_eq!(report.n_test, 40);
        assert_eq!(report.n_train, 160);
        assert_eq!(report.holdout_probabilities.len(), 40);
        assert!(
            report.holdout_accuracy > 0.7,
            "accuracy {}",
            report.holdout_accuracy
        );
        assert!(report.holdout_log_loss.is_finite());

        let (_, test) = dataset(200).train_test_split(0.2, 42).unwrap();
        let expected = test.n_positive() as f64 / 40.0;
        assert_eq!(report.holdout_positive_rate, expected);
    }

    #[test]
    fn test_fit_is_reproducible() {
        let ds = dataset(120);
        let trainer = Trainer::builder().n_estimators(15).build();
        let a = trainer.fit(&ds).unwrap();
        let b = trainer.fit(&ds).unwrap();

        assert_eq!(a.report, b.report);
        assert_eq!(a.pipeline.extract_params(), b.pipeline.extract_params());
    }

    #[test]
    fn test_fit_propagates_invalid_config() {
        let err = Trainer::builder()
            .n_estimators(0)
            .build()
            .fit(&dataset(50))
            .unwrap_err();
        assert!(matches!(err, PotabilityError::Model(_)));
    }

    #[test]
    fn test_fit_rejects_tiny_dataset() {
        let err = Trainer::default().fit(&dataset(1)).unwrap_err();
        assert!(matches!(err, PotabilityError::DatasetLoad { .. }));
    }
}
