//! Fitted preprocessing stages.
//!
//! Four stages run in fixed order ahead of the classifier:
//! [`EmbarkDeckImputer`] → [`AgeImputer`] → [`ColumnDropper`] →
//! [`FeatureEncoder`]. The imputers capture state once at fit time and
//! replay it at inference; they never recompute statistics from
//! inference data.


use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{Column, Frame, Sex};
use crate::error::{LifeboatError, Result};
use crate::primitives::Matrix;

/// Columns one-hot encoded by the feature encoder.
pub const CATEGORY_COLUMNS: &[&str] = &["sex", "embark_town", "deck"];

/// Columns encoded with a fixed meaningful order.
pub const ORDINAL_COLUMNS: &[&str] = &["pclass"];

/// Columns standardized by the feature encoder.
pub const NUMERICAL_COLUMNS: &[&str] = &["age", "sibsp", "parch", "fare"];

/// Columns removed before encoding. Needed only for upstream imputation
/// grouping, redundant with kept columns, or label-adjacent.
pub const DROPPED_COLUMNS: &[&str] =
    &["class", "who", "adult_male", "embarked", "alive", "alone"];

/// Sentinel category substituted for a missing deck. A literal value,
/// not derived from data.
pub const UNKNOWN_DECK: &str = "Unknown";

/// Fixed ordinal domain for `pclass`.
const PCLASS_ORDER: &[f32] = &[1.0, 2.0, 3.0];

/// Trait for frame-to-frame preprocessing stages.
///
/// Mirrors the fit/transform contract: `fit` captures state from
/// training data, `transform` replays it without mutation.
pub trait FrameTransformer {
    /// Fits the stage to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if the training data is degenerate.
    fn fit(&mut self, frame: &Frame) -> Result<()>;

    /// Transforms a frame using fitted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage is not fitted or a required column
    /// is missing.
    fn transform(&self, frame: &Frame) -> Result<Frame>;

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit_transform(&mut self, frame: &Frame) -> Result<Frame> {
        self.fit(frame)?;
        self.transform(frame)
    }
}

/// Fills missing `embark_town` with the most frequent training-time
/// value and missing `deck` with the [`UNKNOWN_DECK`] sentinel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbarkDeckImputer {
    /// Most frequent non-null `embark_town` (captured at fit).
    most_frequent_embark: Option<String>,
}

impl EmbarkDeckImputer {
    /// Creates an unfitted imputer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The fitted most-frequent embarkation town, if fitted.
    #[must_use]
    pub fn most_frequent_embark(&self) -> Option<&str> {
        self.most_frequent_embark.as_deref()
    }

    /// True once fit has run.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.most_frequent_embark.is_some()
    }
}

impl FrameTransformer for EmbarkDeckImputer {
    fn fit(&mut self, frame: &Frame) -> Result<()> {
        let towns = frame.str_column("embark_town")?;

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for town in towns.iter().flatten() {
            *counts.entry(town.as_str()).or_insert(0) += 1;
        }

        // Strict > over BTreeMap iteration order: ties resolve to the
        // lexicographically smallest town.
        let mut best: Option<(&str, usize)> = None;
        for (town, &count) in &counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((town, count));
            }
        }

        let (town, _) = best.ok_or_else(|| LifeboatError::Fit {
            message: "embark_town is entirely null; most-frequent value is undefined"
                .to_string(),
        })?;
        self.most_frequent_embark = Some(town.to_string());
        Ok(())
    }

    fn transform(&self, frame: &Frame) -> Result<Frame> {
        let fill = self
            .most_frequent_embark
            .as_ref()
            .ok_or(LifeboatError::NotFitted {
                component: "EmbarkDeckImputer",
            })?;

        let mut out = frame.clone();

        let towns: Vec<Option<String>> = frame
            .str_column("embark_town")?
            .iter()
            .map(|t| Some(t.clone().unwrap_or_else(|| fill.clone())))
            .collect();
        out.replace_column("embark_town", Column::Str(towns))?;

        let decks: Vec<Option<String>> = frame
            .str_column("deck")?
            .iter()
            .map(|d| Some(d.clone().unwrap_or_else(|| UNKNOWN_DECK.to_string())))
            .collect();
        out.replace_column("deck", Column::Str(decks))?;

        Ok(out)
    }
}

/// Composite group key for age imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgeKey {
    /// Passenger sex
    pub sex: Sex,
    /// Passenger class (1..=3)
    pub pclass: u8,
    /// Traveling-alone flag
    pub alone: bool,
}

/// Behavior when an inference record's group key was never observed at
/// fit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnseenAgePolicy {
    /// Fail the call with [`LifeboatError::UnseenGroup`].
    #[default]
    Error,
    /// Substitute the global mean age over the fit rows.
    GlobalMean,
}

/// Fills missing `age` from group-wise means keyed by
/// (sex, pclass, alone).
///
/// Children and rows with missing age are excluded from the fit
/// statistics; a flat mean over all rows would bias the imputed values
/// toward child ages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgeImputer {
    group_means: Option<BTreeMap<AgeKey, f32>>,
    global_mean: Option<f32>,
    policy: UnseenAgePolicy,
}

impl AgeImputer {
    /// Creates an unfitted imputer with the default (error) policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the unseen-group policy.
    #[must_use]
    pub fn with_policy(mut self, policy: UnseenAgePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The configured unseen-group policy.
    #[must_use]
    pub fn policy(&self) -> UnseenAgePolicy {
        self.policy
    }

    /// The fitted group means, if fitted.
    #[must_use]
    pub fn group_means(&self) -> Option<&BTreeMap<AgeKey, f32>> {
        self.group_means.as_ref()
    }

    /// True once fit has run.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.group_means.is_some()
    }

    /// Reads the group key for one row of a frame.
    fn key_at(frame: &Frame, row: usize) -> Result<AgeKey> {
        let sex = frame.str_column("sex")?[row]
            .as_deref()
            .ok_or_else(|| LifeboatError::Schema {
                field: "sex".to_string(),
                message: "missing required field 'sex'".to_string(),
            })
            .and_then(Sex::parse)?;
        let pclass = frame.float_column("pclass")?[row];
        if !PCLASS_ORDER.contains(&pclass) {
            return Err(LifeboatError::Schema {
                field: "pclass".to_string(),
                message: format!("must be 1, 2 or 3, got {pclass}"),
            });
        }
        let alone = frame.bool_column("alone")?[row];
        Ok(AgeKey {
            sex,
            pclass: pclass as u8,
            alone,
        })
    }
}

impl FrameTransformer for AgeImputer {
    /// Groups non-child rows with known age by (sex, pclass, alone) and
    /// stores the mean age per group plus the global mean of the same
    /// rows.
    fn fit(&mut self, frame: &Frame) -> Result<()> {
        let ages = frame.float_column("age")?;
        let who = frame.str_column("who")?;

        let mut sums: BTreeMap<AgeKey, (f64, usize)> = BTreeMap::new();
        let mut total = 0.0f64;
        let mut count = 0usize;

        for row in 0..frame.n_rows() {
            if ages[row].is_nan() || who[row].as_deref() == Some("child") {
                continue;
            }
            let key = Self::key_at(frame, row)?;
            let entry = sums.entry(key).or_insert((0.0, 0));
            entry.0 += f64::from(ages[row]);
            entry.1 += 1;
            total += f64::from(ages[row]);
            count += 1;
        }

        if count == 0 {
            return Err(LifeboatError::Fit {
                message: "no adult rows with known age; group means are undefined"
                    .to_string(),
            });
        }

        self.group_means = Some(
            sums.into_iter()
                .map(|(key, (sum, n))| (key, (sum / n as f64) as f32))
                .collect(),
        );
        self.global_mean = Some((total / count as f64) as f32);
        Ok(())
    }

    fn transform(&self, frame: &Frame) -> Result<Frame> {
        let means = self.group_means.as_ref().ok_or(LifeboatError::NotFitted {
            component: "AgeImputer",
        })?;

        let ages = frame.float_column("age")?;
        let mut filled = Vec::with_capacity(ages.len());
        for (row, &age) in ages.iter().enumerate() {
            if !age.is_nan() {
                filled.push(age);
                continue;
            }
            let key = Self::key_at(frame, row)?;
            match means.get(&key) {
                Some(&mean) => filled.push(mean),
                None => match self.policy {
                    UnseenAgePolicy::Error => {
                        return Err(LifeboatError::UnseenGroup {
                            sex: key.sex,
                            pclass: key.pclass,
                            alone: key.alone,
                        });
                    }
                    UnseenAgePolicy::GlobalMean => {
                        let global =
                            self.global_mean.ok_or(LifeboatError::NotFitted {
                                component: "AgeImputer",
                            })?;
                        filled.push(global);
                    }
                },
            }
        }

        let mut out = frame.clone();
        out.replace_column("age", Column::Float(filled))?;
        Ok(out)
    }
}

/// Removes the configured columns. Stateless; `fit` is a no-op.
///
/// Must run after [`AgeImputer`] (which reads `who` and `alone`) and
/// before [`FeatureEncoder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDropper {
    columns_to_drop: Vec<String>,
}

impl Default for ColumnDropper {
    fn default() -> Self {
        Self {
            columns_to_drop: DROPPED_COLUMNS.iter().map(|&s| s.to_string()).collect(),
        }
    }
}

impl ColumnDropper {
    /// Creates a dropper for the default column set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the column set to drop.
    #[must_use]
    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns_to_drop: columns.iter().map(|&s| s.to_string()).collect(),
        }
    }

    /// The configured column set.
    #[must_use]
    pub fn columns_to_drop(&self) -> Vec<&str> {
        self.columns_to_drop.iter().map(String::as_str).collect()
    }
}

impl FrameTransformer for ColumnDropper {
    fn fit(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }

    fn transform(&self, frame: &Frame) -> Result<Frame> {
        frame.drop_columns(&self.columns_to_drop())
    }
}

/// Standardizes numeric columns to zero mean and unit variance.
///
/// Population standard deviation, matching the convention the original
/// scaling used; near-zero deviations leave the column centered only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Vec<f32>>,
    std: Option<Vec<f32>>,
}

impl StandardScaler {
    /// Creates an unfitted scaler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The fitted per-column means.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn mean(&self) -> &[f32] {
        self.mean.as_ref().expect("Scaler not fitted. Call fit() first.")
    }

    /// The fitted per-column standard deviations.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn std(&self) -> &[f32] {
        self.std.as_ref().expect("Scaler not fitted. Call fit() first.")
    }

    /// True once fit has run.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Computes per-column mean and population std.
    ///
    /// # Errors
    ///
    /// Returns an error on zero samples.
    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples == 0 {
            return Err(LifeboatError::Fit {
                message: "cannot fit scaler with zero samples".to_string(),
            });
        }

        let mut mean = vec![0.0; n_features];
        for (j, mean_j) in mean.iter_mut().enumerate() {
            let mut sum = 0.0;
            for i in 0..n_samples {
                sum += x.get(i, j);
            }
            *mean_j = sum / n_samples as f32;
        }

        let mut std = vec![0.0; n_features];
        for (j, std_j) in std.iter_mut().enumerate() {
            let mut sum_sq = 0.0;
            for i in 0..n_samples {
                let diff = x.get(i, j) - mean[j];
                sum_sq += diff * diff;
            }
            *std_j = (sum_sq / n_samples as f32).sqrt();
        }

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    /// Applies the fitted centering and scaling.
    ///
    /// # Errors
    ///
    /// Returns an error if unfitted or the width doesn't match.
    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let mean = self.mean.as_ref().ok_or(LifeboatError::NotFitted {
            component: "StandardScaler",
        })?;
        let std = self.std.as_ref().ok_or(LifeboatError::NotFitted {
            component: "StandardScaler",
        })?;

        let (n_samples, n_features) = x.shape();
        if n_features != mean.len() {
            return Err("Feature dimension mismatch".into());
        }

        let mut out = Matrix::zeros(n_samples, n_features);
        for i in 0..n_samples {
            for j in 0..n_features {
                let mut val = x.get(i, j) - mean[j];
                if std[j] > 1e-10 {
                    val /= std[j];
                }
                out.set(i, j, val);
            }
        }
        Ok(out)
    }
}

/// Encodes a post-dropper frame into the fixed-width numeric feature
/// matrix the classifier consumes.
///
/// One-hot blocks for the category columns (unknown inference-time
/// categories encode to all zeros, never an error), the fixed ordinal
/// map for `pclass`, then standardized numerics. Column order is stable
/// and identical between training and inference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureEncoder {
    /// Sorted category vocabulary per entry of [`CATEGORY_COLUMNS`].
    vocabularies: Option<Vec<Vec<String>>>,
    scaler: StandardScaler,
    feature_names: Option<Vec<String>>,
}

impl FeatureEncoder {
    /// Creates an unfitted encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once fit has run.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.vocabularies.is_some()
    }

    /// Names of the output feature columns, in output order.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder is not fitted.
    pub fn feature_names(&self) -> Result<&[String]> {
        self.feature_names
            .as_deref()
            .ok_or(LifeboatError::NotFitted {
                component: "FeatureEncoder",
            })
    }

    /// Output feature width.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder is not fitted.
    pub fn n_features(&self) -> Result<usize> {
        Ok(self.feature_names()?.len())
    }

    /// Learns category vocabularies and numeric scaling parameters.
    ///
    /// # Errors
    ///
    /// Returns an error on an empty frame or missing input columns.
    pub fn fit(&mut self, frame: &Frame) -> Result<()> {
        if frame.n_rows() == 0 {
            return Err(LifeboatError::Fit {
                message: "cannot fit encoder on zero rows".to_string(),
            });
        }

        let mut vocabularies = Vec::with_capacity(CATEGORY_COLUMNS.len());
        for &name in CATEGORY_COLUMNS {
            let mut values: Vec<String> = frame
                .str_column(name)?
                .iter()
                .flatten()
                .cloned()
                .collect();
            values.sort_unstable();
            values.dedup();
            if values.is_empty() {
                return Err(LifeboatError::Fit {
                    message: format!("column '{name}' has no categories to encode"),
                });
            }
            vocabularies.push(values);
        }

        self.scaler = StandardScaler::new();
        self.scaler.fit(&numeric_block(frame)?)?;

        let mut names = Vec::new();
        for (column, vocab) in CATEGORY_COLUMNS.iter().zip(&vocabularies) {
            for value in vocab {
                names.push(format!("{column}={value}"));
            }
        }
        names.extend(ORDINAL_COLUMNS.iter().map(|&c| c.to_string()));
        names.extend(NUMERICAL_COLUMNS.iter().map(|&c| c.to_string()));

        self.vocabularies = Some(vocabularies);
        self.feature_names = Some(names);
        Ok(())
    }

    /// Encodes a frame into the feature matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if unfitted, a column is missing, or `pclass`
    /// falls outside its fixed domain.
    pub fn transform(&self, frame: &Frame) -> Result<Matrix> {
        let vocabularies = self.vocabularies.as_ref().ok_or(LifeboatError::NotFitted {
            component: "FeatureEncoder",
        })?;

        let n_rows = frame.n_rows();
        let cat_width: usize = vocabularies.iter().map(Vec::len).sum();
        let width = cat_width + ORDINAL_COLUMNS.len() + NUMERICAL_COLUMNS.len();

        let scaled = self.scaler.transform(&numeric_block(frame)?)?;
        let pclass = frame.float_column("pclass")?;

        let mut out = Matrix::zeros(n_rows, width);
        for row in 0..n_rows {
            let mut col = 0;

            for (name, vocab) in CATEGORY_COLUMNS.iter().zip(vocabularies) {
                let value = &frame.str_column(name)?[row];
                if let Some(value) = value {
                    // Unknown category: leave the whole block zero.
                    if let Some(pos) = vocab.iter().position(|v| v == value) {
                        out.set(row, col + pos, 1.0);
                    }
                }
                col += vocab.len();
            }

            let class = pclass[row];
            let ordinal = PCLASS_ORDER
                .iter()
                .position(|&v| v == class)
                .ok_or_else(|| LifeboatError::Schema {
                    field: "pclass".to_string(),
                    message: format!("must be 1, 2 or 3, got {class}"),
                })?;
            out.set(row, col, ordinal as f32);
            col += 1;

            for j in 0..NUMERICAL_COLUMNS.len() {
                out.set(row, col + j, scaled.get(row, j));
            }
        }

        Ok(out)
    }

    /// Fits and encodes in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    pub fn fit_transform(&mut self, frame: &Frame) -> Result<Matrix> {
        self.fit(frame)?;
        self.transform(frame)
    }
}

/// Collects the numeric columns into a matrix, in policy order.
fn numeric_block(frame: &Frame) -> Result<Matrix> {
    let n_rows = frame.n_rows();
    let mut data = vec![0.0; n_rows * NUMERICAL_COLUMNS.len()];
    for (j, &name) in NUMERICAL_COLUMNS.iter().enumerate() {
        let values = frame.float_column(name)?;
        for (i, &v) in values.iter().enumerate() {
            data[i * NUMERICAL_COLUMNS.len() + j] = v;
        }
    }
    Matrix::from_vec(n_rows, NUMERICAL_COLUMNS.len(), data).map_err(Into::into)
}
