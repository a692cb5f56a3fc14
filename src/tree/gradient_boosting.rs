//! Gradient boosting classifier.
//!
//! Shallow decision trees fit iteratively to log-loss pseudo-residuals,
//! starting from the log-odds of the positive class.

use serde::{Deserialize, Serialize};

use super::DecisionTreeClassifier;
use crate::error::{LifeboatError, Result};
use crate::primitives::Matrix;

/// Gradient-boosted binary classifier.
///
/// Each round fits a tree to the sign of the residuals `y - p`, then
/// nudges the raw log-odds predictions by `learning_rate` in the
/// direction the tree votes. Final probability is the sigmoid of the
/// accumulated raw prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    n_estimators: usize,
    learning_rate: f32,
    max_depth: usize,
    init_prediction: f32,
    estimators: Vec<DecisionTreeClassifier>,
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl GradientBoostingClassifier {
    /// Creates an untrained classifier.
    ///
    /// Defaults: 100 estimators, learning rate 0.1, max depth 3.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            init_prediction: 0.0,
            estimators: Vec::new(),
        }
    }

    /// Sets the number of boosting rounds.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Sets the shrinkage applied to each tree's vote. Typical values
    /// 0.01–0.3; lower needs more rounds.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the depth of each weak learner.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of fitted trees.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.estimators.len()
    }

    /// The configured learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// True once fit has run.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.estimators.is_empty()
    }

    fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-x).exp())
    }

    /// Trains the ensemble on binary labels.
    ///
    /// # Errors
    ///
    /// Returns an error on empty data, a sample/label mismatch, or a
    /// non-binary label.
    pub fn fit(&mut self, x: &Matrix, y: &[usize]) -> Result<()> {
        let n_samples = x.n_rows();
        if n_samples != y.len() {
            return Err("x and y must have the same number of samples".into());
        }
        if n_samples == 0 {
            return Err("Cannot fit with 0 samples".into());
        }
        if let Some(&bad) = y.iter().find(|&&label| label > 1) {
            return Err(LifeboatError::Other(format!(
                "Labels must be 0 or 1, got {bad}"
            )));
        }

        // Initial raw prediction: log-odds of the positive class,
        // clamped for degenerate single-class data.
        let positives = y.iter().filter(|&&label| label == 1).count();
        let p = positives as f32 / n_samples as f32;
        self.init_prediction = if p > 0.0 && p < 1.0 {
            (p / (1.0 - p)).ln()
        } else if p >= 1.0 {
            5.0
        } else {
            -5.0
        };

        let mut raw = vec![self.init_prediction; n_samples];
        self.estimators = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            // Pseudo-residuals for log-loss: y - sigmoid(raw).
            // The weak learner fits their sign as a 0/1 label.
            let residual_labels: Vec<usize> = raw
                .iter()
                .zip(y)
                .map(|(&r, &yi)| usize::from(yi as f32 - Self::sigmoid(r) >= 0.0))
                .collect();

            let mut tree = DecisionTreeClassifier::new().with_max_depth(self.max_depth);
            tree.fit(x, &residual_labels)?;

            let votes = tree.predict(x)?;
            for (ri, vote) in raw.iter_mut().zip(votes) {
                *ri += self.learning_rate * if vote == 0 { -1.0 } else { 1.0 };
            }

            self.estimators.push(tree);
        }

        Ok(())
    }

    /// Predicts binary labels (probability threshold 0.5).
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not trained.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| usize::from(p >= 0.5))
            .collect())
    }

    /// Predicts the probability of the positive class per sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not trained.
    pub fn predict_proba(&self, x: &Matrix) -> Result<Vec<f32>> {
        if self.estimators.is_empty() {
            return Err(LifeboatError::NotFitted {
                component: "GradientBoostingClassifier",
            });
        }

        let n_samples = x.n_rows();
        let mut raw = vec![self.init_prediction; n_samples];
        for tree in &self.estimators {
            let votes = tree.predict(x)?;
            for (ri, vote) in raw.iter_mut().zip(votes) {
                *ri += self.learning_rate * if vote == 0 { -1.0 } else { 1.0 };
            }
        }

        Ok(raw.into_iter().map(Self::sigmoid).collect())
    }

    /// Accuracy on test data.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not trained.
    pub fn score(&self, x: &Matrix, y: &[usize]) -> Result<f32> {
        Ok(crate::metrics::accuracy(&self.predict(x)?, y))
    }
}
