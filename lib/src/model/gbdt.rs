//! Gradient-boosted tree ensemble for binary classification.
//!
//! Second-order boosting on the logistic loss: every round fits one
//! [`RegressionTree`] to the gradient and hessian of the current margins and
//! adds its (learning-rate scaled) output to them.
//!
//! # Example
//! ```
//! use ndarray::array;
//! use potability::model::{BoostingConfig, GradientBoostingClassifier, InferenceModel};
//!
//! let x = array![[0.0], [1.0], [2.0], [3.0]];
//! let y = [0.0, 0.0, 1.0, 1.0];
//! let config = BoostingConfig {
//!     n_estimators: 10,
//!     min_child_weight: 0.0,
//!     ..Default::default()
//! };
//! let model = GradientBoostingClassifier::new(config).fit(&x, &y)?;
//! assert!(model.predict(&[3.0]) > 0.5);
//! # Ok::<(), potability::model::ModelError>(())
//! ```

use super::state::{Fitted, Unfitted};
use super::tree::{RegressionTree, TreeGrower, TreeParams};
use super::{InferenceModel, ModelError};
use crate::loss::{sigmoid, LogLoss};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tracing::{debug, info};

/// Boosting rounds between training log-loss reports.
const LOG_EVERY: usize = 10;

/// Hyperparameters of the ensemble.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoostingConfig {
    /// Number of trees.
    pub n_estimators: usize,
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// Shrinkage applied to every leaf value (`eta`).
    pub learning_rate: f64,
    /// L2 regularization on leaf weights.
    pub reg_lambda: f64,
    /// Minimum gain required to split.
    pub gamma: f64,
    /// Minimum hessian sum in each child.
    pub min_child_weight: f64,
    /// Initial probability for every row.
    pub base_score: f64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.3,
            reg_lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            base_score: 0.5,
        }
    }
}

impl BoostingConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ModelError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.reg_lambda >= 0.0 && self.reg_lambda.is_finite()) {
            return Err(ModelError::InvalidConfig(format!(
                "reg_lambda must be non-negative, got {}",
                self.reg_lambda
            )));
        }
        if !(self.gamma >= 0.0 && self.gamma.is_finite()) {
            return Err(ModelError::InvalidConfig(format!(
                "gamma must be non-negative, got {}",
                self.gamma
            )));
        }
        if !(self.min_child_weight >= 0.0 && self.min_child_weight.is_finite()) {
            return Err(ModelError::InvalidConfig(format!(
                "min_child_weight must be non-negative, got {}",
                self.min_child_weight
            )));
        }
        if !(self.base_score > 0.0 && self.base_score < 1.0) {
            return Err(ModelError::InvalidConfig(format!(
                "base_score must be in (0, 1), got {}",
                self.base_score
            )));
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
            reg_lambda: self.reg_lambda,
            gamma: self.gamma,
            min_child_weight: self.min_child_weight,
        }
    }
}

/// Serializable state of a fitted ensemble.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    pub config: BoostingConfig,
    pub base_margin: f64,
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

/// Gradient-boosted classifier. The state parameter is [`Unfitted`] or [`Fitted`].
#[derive(Clone, Debug)]
pub struct GradientBoostingClassifier<S> {
    config: BoostingConfig,
    base_margin: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
    _state: PhantomData<S>,
}

impl GradientBoostingClassifier<Unfitted> {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            base_margin: 0.0,
            n_features: 0,
            trees: Vec::new(),
            _state: PhantomData,
        }
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    /// Fit the ensemble on finite features and 0/1 labels.
    pub fn fit(
        self,
        x: &Array2<f64>,
        y: &[f64],
    ) -> Result<GradientBoostingClassifier<Fitted>, ModelError> {
        self.config.validate()?;
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 {
            return Err(ModelError::EmptyData);
        }
        if y.len() != n_rows {
            return Err(ModelError::LabelCountMismatch {
                rows: n_rows,
                labels: y.len(),
            });
        }
        if let Some((row, &value)) = y
            .iter()
            .enumerate()
            .find(|(_, v)| **v != 0.0 && **v != 1.0)
        {
            return Err(ModelError::InvalidLabel { row, value });
        }
        if let Some(((row, column), &value)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ModelError::NonFiniteFeature { row, column, value });
        }

        let loss = LogLoss;
        let params = self.config.tree_params();
        let base_margin = crate::loss::logit(self.config.base_score);
        let mut margins = vec![base_margin; n_rows];
        let mut grad = vec![0.0; n_rows];
        let mut hess = vec![0.0; n_rows];
        let mut trees = Vec::with_capacity(self.config.n_estimators);

        info!(
            rows = n_rows,
            features = n_features,
            n_estimators = self.config.n_estimators,
            max_depth = self.config.max_depth,
            learning_rate = self.config.learning_rate,
            "fitting gradient boosting classifier"
        );

        for round in 0..self.config.n_estimators {
            for i in 0..n_rows {
                let (g, h) = loss.gradient_hessian(margins[i], y[i]);
                grad[i] = g;
                hess[i] = h;
            }

            let tree = TreeGrower::new(x.view(), &grad, &hess, params).grow();
            for (margin, row) in margins.iter_mut().zip(x.axis_iter(Axis(0))) {
                *margin += tree.predict_row(row);
            }
            debug!(
                round,
                leaves = tree.n_leaves(),
                depth = tree.depth(),
                "grew tree"
            );
            trees.push(tree);

            let done = round + 1;
            if done % LOG_EVERY == 0 || done == self.config.n_estimators {
                let probs: Vec<f64> = margins.iter().map(|&m| sigmoid(m)).collect();
                info!(
                    round = done,
                    train_logloss = loss.mean_loss(&probs, y),
                    "boosting progress"
                );
            }
        }

        Ok(GradientBoostingClassifier {
            config: self.config,
            base_margin,
            n_features,
            trees,
            _state: PhantomData,
        })
    }
}

impl GradientBoostingClassifier<Fitted> {
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    /// Raw additive score of one row.
    pub fn predict_margin_row(&self, row: ArrayView1<f64>) -> f64 {
        self.trees
            .iter()
            .fold(self.base_margin, |acc, tree| acc + tree.predict_row(row))
    }

    /// Positive class probability for each row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if x.ncols() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }
        Ok(self.predict_batch(x))
    }

    pub fn extract_params(&self) -> GbdtParams {
        GbdtParams {
            config: self.config.clone(),
            base_margin: self.base_margin,
            n_features: self.n_features,
            trees: self.trees.clone(),
        }
    }

    pub fn from_params(params: GbdtParams) -> Result<Self, ModelError> {
        if params.n_features == 0 {
            return Err(ModelError::Corrupt("model has zero features".to_string()));
        }
        if params.trees.is_empty() {
            return Err(ModelError::Corrupt("model has no trees".to_string()));
        }
        if !params.base_margin.is_finite() {
            return Err(ModelError::Corrupt(format!(
                "non-finite base margin {}",
                params.base_margin
            )));
        }
        for (i, tree) in params.trees.iter().enumerate() {
            tree.validate(params.n_features)
                .map_err(|e| ModelError::Corrupt(format!("tree {i}: {e}")))?;
        }

        Ok(Self {
            config: params.config,
            base_margin: params.base_margin,
            n_features: params.n_features,
            trees: params.trees,
            _state: PhantomData,
        })
    }
}

impl InferenceModel for GradientBoostingClassifier<Fitted> {
    type InputSingle = [f64];
    type OutputSingle = f64;
    type InputBatch = Array2<f64>;
    type OutputBatch = Array1<f64>;

    /// Probability for one row.
    ///
    /// # Panics
    ///
    /// Panics if `input` does not hold exactly `n_features` values.
    fn predict(&self, input: &[f64]) -> f64 {
        assert_eq!(
            input.len(),
            self.n_features,
            "expected {} features, got {}",
            self.n_features,
            input.len()
        );
        sigmoid(self.predict_margin_row(ArrayView1::from(input)))
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Array1<f64> {
        input
            .axis_iter(Axis(0))
            .map(|row| sigmoid(self.predict_margin_row(row)))
            .collect()
    }
}
