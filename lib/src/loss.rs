//! Logistic loss for binary classification on raw margins.
//!
//! The boosting objective works on margins `z` (log-odds). With
//! `p = sigmoid(z)` and a 0/1 target `t`:
//!
//! ```text
//! loss = -(t * ln(p) + (1 - t) * ln(1 - p))
//! dloss/dz   = p - t
//! d²loss/dz² = p * (1 - p)
//! ```

/// Smallest hessian used by the tree learner, to keep leaf weights finite.
pub const MIN_HESSIAN: f64 = 1e-16;

/// Probabilities are clipped to `[EPS, 1 - EPS]` when evaluating the loss.
const EPS: f64 = 1e-15;

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Log-odds of a probability; the inverse of [`sigmoid`].
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Binary cross-entropy on margins (`binary:logistic`).
#[derive(Clone, Copy, Debug, Default)]
pub struct LogLoss;

impl LogLoss {
    /// First and second derivative of the loss with respect to the margin.
    pub fn gradient_hessian(&self, margin: f64, target: f64) -> (f64, f64) {
        let p = sigmoid(margin);
        (p - target, (p * (1.0 - p)).max(MIN_HESSIAN))
    }

    /// Mean log-loss of predicted probabilities against 0/1 targets.
    ///
    /// Returns 0 for empty input.
    pub fn mean_loss(&self, probabilities: &[f64], targets: &[f64]) -> f64 {
        debug_assert_eq!(probabilities.len(), targets.len());
        if targets.is_empty() {
            return 0.0;
        }
        let total: f64 = probabilities
            .iter()
            .zip(targets)
            .map(|(&p, &t)| {
                let p = p.clamp(EPS, 1.0 - EPS);
                -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
            })
            .sum();
        total / targets.len() as f64
    }
}
