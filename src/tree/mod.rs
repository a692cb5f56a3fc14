//! Decision tree classifier (CART, Gini impurity).
//!
//! The weak learner behind the gradient-boosted ensemble. Splits use
//! midpoint thresholds between sorted unique feature values; ties in
//! majority voting resolve deterministically to the lowest class.

mod gradient_boosting;

pub use gradient_boosting::GradientBoostingClassifier;

use serde::{Deserialize, Serialize};

use crate::error::{LifeboatError, Result};
use crate::primitives::Matrix;

/// A node of the fitted tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    /// Terminal node carrying the predicted class.
    Leaf { class_label: usize, n_samples: usize },
    /// Binary split on one feature.
    Split {
        feature_idx: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Decision tree classifier.
///
/// # Examples
///
/// ```
/// use lifeboat::primitives::Matrix;
/// use lifeboat::tree::DecisionTreeClassifier;
///
/// // Single-feature data, separable at 0.5.
/// let x = Matrix::from_vec(4, 1, vec![0.0, 0.2, 0.8, 1.0]).unwrap();
/// let y = [0, 0, 1, 1];
///
/// let mut tree = DecisionTreeClassifier::new().with_max_depth(2);
/// tree.fit(&x, &y).unwrap();
/// assert_eq!(tree.predict(&x).unwrap(), vec![0, 0, 1, 1]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    root: Option<TreeNode>,
    max_depth: Option<usize>,
    n_features: Option<usize>,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeClassifier {
    /// Creates an unfitted tree with no depth limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            n_features: None,
        }
    }

    /// Sets the maximum depth (root at depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// True once fit has run.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Fits the tree to training data.
    ///
    /// # Errors
    ///
    /// Returns an error on empty data or a sample/label count mismatch.
    pub fn fit(&mut self, x: &Matrix, y: &[usize]) -> Result<()> {
        let (n_rows, n_cols) = x.shape();
        if n_rows != y.len() {
            return Err("Number of samples in x and y must match".into());
        }
        if n_rows == 0 {
            return Err("Cannot fit with zero samples".into());
        }

        self.n_features = Some(n_cols);
        self.root = Some(build_tree(x, y, 0, self.max_depth));
        Ok(())
    }

    /// Predicts class labels.
    ///
    /// # Errors
    ///
    /// Returns an error if unfitted or the feature width doesn't match
    /// the training data.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<usize>> {
        let root = self.root.as_ref().ok_or(LifeboatError::NotFitted {
            component: "DecisionTreeClassifier",
        })?;

        let (n_samples, n_features) = x.shape();
        if let Some(expected) = self.n_features {
            if n_features != expected {
                return Err(LifeboatError::Other(format!(
                    "Feature count mismatch: trained with {expected}, input has {n_features}"
                )));
            }
        }

        Ok((0..n_samples)
            .map(|row| predict_one(root, x.row_slice(row)))
            .collect())
    }

    /// Accuracy on test data.
    ///
    /// # Errors
    ///
    /// Returns an error if unfitted.
    pub fn score(&self, x: &Matrix, y: &[usize]) -> Result<f32> {
        Ok(crate::metrics::accuracy(&self.predict(x)?, y))
    }
}

/// Walks one sample down the tree.
fn predict_one(root: &TreeNode, sample: &[f32]) -> usize {
    let mut node = root;
    loop {
        match node {
            TreeNode::Leaf { class_label, .. } => return *class_label,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                node = if sample[*feature_idx] <= *threshold {
                    left
                } else {
                    right
                };
            }
        }
    }
}

/// Gini impurity of a label set: 1 - Σ p_i².
fn gini_impurity(labels: &[usize]) -> f32 {
    if labels.is_empty() {
        return 0.0;
    }

    let mut counts = std::collections::BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0usize) += 1;
    }

    let n = labels.len() as f32;
    let mut gini = 1.0;
    for &count in counts.values() {
        let p = count as f32 / n;
        gini -= p * p;
    }
    gini
}

/// Majority class; BTreeMap order makes ties resolve to the lowest
/// class label.
fn majority_class(labels: &[usize]) -> usize {
    let mut counts = std::collections::BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0usize) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|&(_, count)| count)
        .expect("at least one label")
        .0
}

/// Best (feature, threshold) by Gini gain across all features, or None
/// when no split improves on the current impurity.
fn find_best_split(x: &Matrix, y: &[usize]) -> Option<(usize, f32)> {
    let (n_samples, n_features) = x.shape();
    if n_samples < 2 {
        return None;
    }

    let current = gini_impurity(y);
    let mut best: Option<(usize, f32, f32)> = None;

    for feature_idx in 0..n_features {
        let mut values: Vec<f32> = (0..n_samples).map(|row| x.get(row, feature_idx)).collect();
        values.sort_by(|a, b| a.partial_cmp(b).expect("feature values are comparable"));
        values.dedup_by(|a, b| (*a - *b).abs() < 1e-10);

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;

            let mut left = Vec::new();
            let mut right = Vec::new();
            for row in 0..n_samples {
                if x.get(row, feature_idx) <= threshold {
                    left.push(y[row]);
                } else {
                    right.push(y[row]);
                }
            }
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let weighted = (left.len() as f32 * gini_impurity(&left)
                + right.len() as f32 * gini_impurity(&right))
                / n_samples as f32;
            let gain = current - weighted;

            if gain > 0.0 && best.map_or(true, |(_, _, g)| gain > g) {
                best = Some((feature_idx, threshold, gain));
            }
        }
    }

    best.map(|(feature_idx, threshold, _)| (feature_idx, threshold))
}

/// Recursively builds the tree.
fn build_tree(x: &Matrix, y: &[usize], depth: usize, max_depth: Option<usize>) -> TreeNode {
    let n_samples = y.len();

    let pure = y.iter().all(|&label| label == y[0]);
    let depth_reached = max_depth.is_some_and(|max| depth >= max);
    if pure || depth_reached {
        return TreeNode::Leaf {
            class_label: majority_class(y),
            n_samples,
        };
    }

    let Some((feature_idx, threshold)) = find_best_split(x, y) else {
        return TreeNode::Leaf {
            class_label: majority_class(y),
            n_samples,
        };
    };

    let (mut left_idx, mut right_idx) = (Vec::new(), Vec::new());
    for row in 0..n_samples {
        if x.get(row, feature_idx) <= threshold {
            left_idx.push(row);
        } else {
            right_idx.push(row);
        }
    }

    let (left_x, left_y) = subset(x, y, &left_idx);
    let (right_x, right_y) = subset(x, y, &right_idx);

    TreeNode::Split {
        feature_idx,
        threshold,
        left: Box::new(build_tree(&left_x, &left_y, depth + 1, max_depth)),
        right: Box::new(build_tree(&right_x, &right_y, depth + 1, max_depth)),
    }
}

/// Extracts the rows at `indices`.
fn subset(x: &Matrix, y: &[usize], indices: &[usize]) -> (Matrix, Vec<usize>) {
    let n_cols = x.n_cols();
    let mut data = Vec::with_capacity(indices.len() * n_cols);
    let mut labels = Vec::with_capacity(indices.len());
    for &idx in indices {
        data.extend_from_slice(x.row_slice(idx));
        labels.push(y[idx]);
    }
    let matrix =
        Matrix::from_vec(indices.len(), n_cols, data).expect("subset dimensions are consistent");
    (matrix, labels)
}
