//! Regression trees fitted to gradient statistics.
//!
//! Each boosting round grows one tree on the per-row gradient and hessian of
//! the loss. Trees are stored as a flat node vector with the root at index 0
//! and children always after their parent.

use super::ModelError;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// One node of a [`RegressionTree`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Rows with `x[feature] < threshold` (or NaN) go to `left`, others to `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node contributing `value` to the margin.
    Leaf { value: f64 },
}

/// A binary regression tree over feature rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Tree with a single leaf.
    pub fn leaf(value: f64) -> Self {
        Self {
            nodes: vec![Node::Leaf { value }],
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// Margin contribution of one row.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row[feature];
                    idx = if x < threshold || x.is_nan() {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Structural check for trees restored from bytes: indices in range,
    /// children after parents, features within `n_features`, finite values.
    pub fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Corrupt("tree has no nodes".to_string()));
        }
        let n = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(ModelError::Corrupt(format!(
                        "leaf {idx} has non-finite value {value}"
                    )));
                }
                Node::Leaf { .. } => {}
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(ModelError::Corrupt(format!(
                            "node {idx} splits on feature {feature} of {n_features}"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(ModelError::Corrupt(format!("node {idx} has NaN threshold")));
                    }
                    if left <= idx || right <= idx || left >= n || right >= n {
                        return Err(ModelError::Corrupt(format!(
                            "node {idx} has invalid children {left}, {right}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Hyperparameters for growing a single tree.
#[derive(Clone, Copy, Debug)]
pub struct TreeParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub reg_lambda: f64,
    pub gamma: f64,
    pub min_child_weight: f64,
}

impl TreeParams {
    fn leaf_weight(&self, grad: f64, hess: f64) -> f64 {
        -grad / (hess + self.reg_lambda)
    }

    fn score(&self, grad: f64, hess: f64) -> f64 {
        grad * grad / (hess + self.reg_lambda)
    }
}

#[derive(Clone, Copy, Debug)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Exact greedy, depth-first tree learner.
pub struct TreeGrower<'a> {
    x: ArrayView2<'a, f64>,
    grad: &'a [f64],
    hess: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
}

impl<'a> TreeGrower<'a> {
    pub fn new(
        x: ArrayView2<'a, f64>,
        grad: &'a [f64],
        hess: &'a [f64],
        params: TreeParams,
    ) -> Self {
        debug_assert_eq!(x.nrows(), grad.len());
        debug_assert_eq!(grad.len(), hess.len());
        Self {
            x,
            grad,
            hess,
            params,
            nodes: Vec::new(),
        }
    }

    /// Grow a tree over all rows.
    pub fn grow(mut self) -> RegressionTree {
        let mut rows: Vec<usize> = (0..self.x.nrows()).collect();
        self.build(&mut rows, 0);
        RegressionTree { nodes: self.nodes }
    }

    fn build(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let (g, h) = rows
            .iter()
            .fold((0.0, 0.0), |(g, h), &r| (g + self.grad[r], h + self.hess[r]));

        let idx = self.nodes.len();
        let leaf_value = self.params.leaf_weight(g, h) * self.params.learning_rate;
        self.nodes.push(Node::Leaf { value: leaf_value });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return idx;
        }
        let Some(split) = self.best_split(rows, g, h) else {
            return idx;
        };

        let n_left = partition(rows, |&r| self.x[[r, split.feature]] < split.threshold);
        let (left_rows, right_rows) = rows.split_at_mut(n_left);
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    /// Highest-gain split over all features, if any has positive gain.
    ///
    /// Candidates are scanned in feature order then ascending threshold; only
    /// a strictly better gain replaces the current best.
    fn best_split(&self, rows: &[usize], g_total: f64, h_total: f64) -> Option<SplitCandidate> {
        let p = &self.params;
        let parent_score = p.score(g_total, h_total);
        let mut best: Option<SplitCandidate> = None;
        let mut sorted = rows.to_vec();

        for feature in 0..self.x.ncols() {
            let column = self.x.column(feature);
            sorted.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

            let (mut g_left, mut h_left) = (0.0, 0.0);
            for i in 0..sorted.len() - 1 {
                let r = sorted[i];
                g_left += self.grad[r];
                h_left += self.hess[r];

                let value = column[r];
                let next = column[sorted[i + 1]];
                if next <= value {
                    continue;
                }
                let h_right = h_total - h_left;
                if h_left < p.min_child_weight || h_right < p.min_child_weight {
                    continue;
                }

                let g_right = g_total - g_left;
                let children = p.score(g_left, h_left) + p.score(g_right, h_right);
                let gain = 0.5 * (children - parent_score) - p.gamma;
                if gain > best.map_or(0.0, |b| b.gain) {
                    let mut threshold = value + (next - value) / 2.0;
                    if threshold <= value {
                        threshold = next;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }
}

/// Move rows satisfying `pred` to the front; returns how many there are.
/// Relative order is not preserved.
fn partition<F: Fn(&usize) -> bool>(rows: &mut [usize], pred: F) -> usize {
    let mut n = 0;
    for i in 0..rows.len() {
        if pred(&rows[i]) {
            rows.swap(n, i);
            n += 1;
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            learning_rate: 1.0,
            reg_lambda: 0.0,
            gamma: 0.0,
            min_child_weight: 0.0,
        }
    }

    #[test]
    fn test_single_split_separates_gradients() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let grad = [-1.0, -1.0, 1.0, 1.0];
        let hess = [1.0; 4];
        let tree = TreeGrower::new(x.view(), &grad, &hess, params(1)).grow();

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        match tree.nodes()[0] {
            Node::Split {
                feature, threshold, ..
            } => {
                assert_eq!(feature, 0);
                assert_eq!(threshold, 2.5);
            }
            _ => panic!("root should split"),
        }
        // leaf weight = -G / H
        assert_eq!(tree.predict_row(x.row(0)), 1.0);
        assert_eq!(tree.predict_row(x.row(3)), -1.0);
    }

    #[test]
    fn test_picks_informative_feature() {
        let x = array![[5.0, 0.0], [1.0, 0.0], [5.0, 1.0], [1.0, 1.0]];
        let grad = [1.0, 1.0, -1.0, -1.0];
        let hess = [1.0; 4];
        let tree = TreeGrower::new(x.view(), &grad, &hess, params(3)).grow();

        match tree.nodes()[0] {
            Node::Split { feature, .. } => assert_eq!(feature, 1),
            _ => panic!("root should split"),
        }
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_respects_max_depth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let grad = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let hess = [1.0; 8];
        let tree = TreeGrower::new(x.view(), &grad, &hess, params(2)).grow();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_constant_feature_gives_leaf() {
        let x = array![[3.0], [3.0], [3.0]];
        let grad = [1.0, -1.0, 0.5];
        let hess = [1.0; 3];
        let tree = TreeGrower::new(x.view(), &grad, &hess, params(3)).grow();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_min_child_weight_blocks_small_children() {
        let x = array![[1.0], [2.0], [3.0]];
        let grad = [-1.0, 1.0, 1.0];
        let hess = [0.25; 3];
        let mut p = params(3);
        p.min_child_weight = 1.0;
        let tree = TreeGrower::new(x.view(), &grad, &hess, p).grow();
        assert_eq!(tree.n_leaves(), 1);
    }

    #[test]
    fn test_learning_rate_and_lambda_scale_leaves() {
        let x = array![[1.0], [2.0]];
        let grad = [-2.0, -2.0];
        let hess = [1.0, 1.0];
        let p = TreeParams {
            max_depth: 0,
            learning_rate: 0.5,
            reg_lambda: 2.0,
            gamma: 0.0,
            min_child_weight: 0.0,
        };
        let tree = TreeGrower::new(x.view(), &grad, &hess, p).grow();
        // -(-4) / (2 + 2) * 0.5
        assert_eq!(tree.predict_row(x.row(0)), 0.5);
    }

    #[test]
    fn test_nan_goes_left() {
        let tree = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: -1.0 },
                Node::Leaf { value: 1.0 },
            ],
        };
        assert_eq!(tree.predict_row(array![f64::NAN].view()), -1.0);
        assert_eq!(tree.predict_row(array![0.0].view()), 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_structure() {
        assert!(RegressionTree::leaf(0.1).validate(1).is_ok());
        assert!(RegressionTree { nodes: vec![] }.validate(1).is_err());

        let cyclic = RegressionTree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 1.0,
                left: 0,
                right: 0,
            }],
        };
        assert!(cyclic.validate(1).is_err());

        let out_of_range_feature = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature: 4,
                    threshold: 1.0,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: 0.0 },
                Node::Leaf { value: 0.0 },
            ],
        };
        assert!(out_of_range_feature.validate(3).is_err());
        assert!(out_of_range_feature.validate(5).is_ok());
    }
}
