//! Metrics for evaluating binary classifiers on holdout rows.

use crate::loss::LogLoss;
use crate::schema::Potability;

/// Classification metrics over 0/1 targets.
pub struct Metrics;

impl Metrics {
    /// Fraction of rows where the thresholded probability matches the target.
    ///
    /// # Arguments
    ///
    /// * `y_true` - Ground truth labels (0 or 1)
    /// * `y_prob` - Predicted positive class probabilities
    ///
    /// # Returns
    ///
    /// The accuracy in `[0, 1]` (higher is better); 0 for empty input.
    pub fn accuracy(y_true: &[f64], y_prob: &[f64]) -> f64 {
        assert_eq!(
            y_true.len(),
            y_prob.len(),
            "Arrays must have the same length"
        );

        if y_true.is_empty() {
            return 0.0;
        }

        let correct = y_true
            .iter()
            .zip(y_prob.iter())
            .filter(|(&t, &p)| Potability::from_probability(p).as_class() == t)
            .count();

        correct as f64 / y_true.len() as f64
    }

    /// Mean binary cross-entropy (lower is better).
    pub fn log_loss(y_true: &[f64], y_prob: &[f64]) -> f64 {
        assert_eq!(
            y_true.len(),
            y_prob.len(),
            "Arrays must have the same length"
        );
        LogLoss.mean_loss(y_prob, y_true)
    }

    /// Share of rows labeled 1.
    pub fn positive_rate(y_true: &[f64]) -> f64 {
        if y_true.is_empty() {
            return 0.0;
        }
        y_true.iter().filter(|&&t| t == 1.0).count() as f64 / y_true.len() as f64
    }
}
