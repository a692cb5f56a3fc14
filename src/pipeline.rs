//! Pipeline composition.
//!
//! [`SurvivalPipeline`] is the untrained configuration; fitting consumes
//! it and yields a [`FittedPipeline`]. The two types make the state
//! machine a compile-time fact: an untrained pipeline has no `predict`,
//! a fitted one has no `fit`.

use serde::{Deserialize, Serialize};

use crate::data::{Frame, Passenger};
use crate::error::{LifeboatError, Result};
use crate::preprocessing::{
    AgeImputer, ColumnDropper, EmbarkDeckImputer, FeatureEncoder, FrameTransformer,
    UnseenAgePolicy,
};
use crate::primitives::Matrix;
use crate::tree::GradientBoostingClassifier;

/// Untrained pipeline configuration.
///
/// # Examples
///
/// ```no_run
/// use lifeboat::data::Frame;
/// use lifeboat::pipeline::SurvivalPipeline;
///
/// # fn demo(frame: &Frame, y: &[usize]) -> lifeboat::Result<()> {
/// let fitted = SurvivalPipeline::new()
///     .with_n_estimators(221)
///     .with_learning_rate(0.1022)
///     .with_max_depth(5)
///     .fit(frame, y)?;
/// let labels = fitted.predict_frame(frame)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SurvivalPipeline {
    n_estimators: usize,
    learning_rate: f32,
    max_depth: usize,
    unseen_age_policy: UnseenAgePolicy,
}

impl Default for SurvivalPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SurvivalPipeline {
    /// Creates a pipeline with default classifier parameters
    /// (100 estimators, learning rate 0.1, depth 3) and the error
    /// policy for unseen age groups.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            unseen_age_policy: UnseenAgePolicy::default(),
        }
    }

    /// Sets the number of boosting rounds.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Sets the boosting learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the weak learner depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the behavior for inference-time age groups never seen at fit.
    #[must_use]
    pub fn with_unseen_age_policy(mut self, policy: UnseenAgePolicy) -> Self {
        self.unseen_age_policy = policy;
        self
    }

    /// Fits every stage in order and returns the trained pipeline.
    ///
    /// Consumes the configuration: the Untrained→Trained transition
    /// happens exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error on empty or degenerate training data, or a
    /// row/label count mismatch.
    pub fn fit(self, frame: &Frame, y: &[usize]) -> Result<FittedPipeline> {
        if frame.n_rows() != y.len() {
            return Err("Frame rows and label count must match".into());
        }
        if frame.n_rows() == 0 {
            return Err(LifeboatError::Fit {
                message: "cannot fit on zero rows".to_string(),
            });
        }

        let mut embark_deck = EmbarkDeckImputer::new();
        let staged = embark_deck.fit_transform(frame)?;

        let mut age = AgeImputer::new().with_policy(self.unseen_age_policy);
        let staged = age.fit_transform(&staged)?;

        let dropper = ColumnDropper::new();
        let staged = dropper.transform(&staged)?;

        let mut encoder = FeatureEncoder::new();
        let features = encoder.fit_transform(&staged)?;

        let mut classifier = GradientBoostingClassifier::new()
            .with_n_estimators(self.n_estimators)
            .with_learning_rate(self.learning_rate)
            .with_max_depth(self.max_depth);
        classifier.fit(&features, y)?;

        Ok(FittedPipeline {
            embark_deck,
            age,
            dropper,
            encoder,
            classifier,
        })
    }
}

/// Trained pipeline: immutable fitted state for every stage plus the
/// classifier.
///
/// All methods take `&self`; nothing here mutates after construction,
/// so a fitted pipeline can be shared freely across threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    embark_deck: EmbarkDeckImputer,
    age: AgeImputer,
    dropper: ColumnDropper,
    encoder: FeatureEncoder,
    classifier: GradientBoostingClassifier,
}

impl FittedPipeline {
    /// Runs the preprocessing stages in fixed order and encodes the
    /// result. Any stage failure aborts the whole call.
    fn encode(&self, frame: &Frame) -> Result<Matrix> {
        let staged = self.embark_deck.transform(frame)?;
        let staged = self.age.transform(&staged)?;
        let staged = self.dropper.transform(&staged)?;
        self.encoder.transform(&staged)
    }

    /// Predicts survival labels for every row of a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails; no partial results are
    /// surfaced.
    pub fn predict_frame(&self, frame: &Frame) -> Result<Vec<usize>> {
        self.classifier.predict(&self.encode(frame)?)
    }

    /// Predicts the survival probability for every row of a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails.
    pub fn predict_proba(&self, frame: &Frame) -> Result<Vec<f32>> {
        self.classifier.predict_proba(&self.encode(frame)?)
    }

    /// Predicts the label for a single validated record.
    ///
    /// # Errors
    ///
    /// Returns a [`LifeboatError::Schema`] error for an out-of-domain
    /// record, or any stage error.
    pub fn predict(&self, passenger: &Passenger) -> Result<usize> {
        Ok(self.predict_with_proba(passenger)?.0)
    }

    /// Predicts label and survival probability for a single record.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FittedPipeline::predict`].
    pub fn predict_with_proba(&self, passenger: &Passenger) -> Result<(usize, f32)> {
        passenger.validate()?;
        let frame = Frame::from_passengers(std::slice::from_ref(passenger))?;
        let proba = self.predict_proba(&frame)?[0];
        Ok((usize::from(proba >= 0.5), proba))
    }

    /// Accuracy over a labeled frame.
    ///
    /// # Errors
    ///
    /// Returns an error if prediction fails or lengths mismatch.
    pub fn score(&self, frame: &Frame, y: &[usize]) -> Result<f32> {
        if frame.n_rows() != y.len() {
            return Err("Frame rows and label count must match".into());
        }
        Ok(crate::metrics::accuracy(&self.predict_frame(frame)?, y))
    }

    /// Names of the encoded feature columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder state is absent (corrupt artifact).
    pub fn feature_names(&self) -> Result<&[String]> {
        self.encoder.feature_names()
    }

    /// Encoded feature width.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder state is absent (corrupt artifact).
    pub fn n_features(&self) -> Result<usize> {
        self.encoder.n_features()
    }

    /// Number of trees in the fitted ensemble.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.classifier.n_estimators()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Sex, Who};

    /// Small synthetic training set with the survival pattern of the
    /// source data: women and first class fare better.
    fn training_records() -> (Vec<Passenger>, Vec<usize>) {
        let mut records = Vec::new();
        let mut labels = Vec::new();

        let base = |pclass: u8, sex: Sex, age: f32, sibsp: u32, fare: f32| Passenger {
            pclass,
            sex,
            age: Some(age),
            sibsp,
            parch: 0,
            fare,
            embarked: Some(if fare > 50.0 { "C" } else { "S" }.to_string()),
            class_name: None,
            who: Some(match sex {
                Sex::Male => Who::Man,
                Sex::Female => Who::Woman,
            }),
            adult_male: None,
            deck: if pclass == 1 {
                Some("B".to_string())
            } else {
                None
            },
            embark_town: Some(
                if fare > 50.0 { "Cherbourg" } else { "Southampton" }.to_string(),
            ),
            alive: None,
            alone: None,
        };

        for (pclass, sex, age, sibsp, fare, survived) in [
            (1, Sex::Female, 38.0, 1, 71.3, 1),
            (1, Sex::Female, 35.0, 1, 53.1, 1),
            (1, Sex::Female, 58.0, 0, 26.6, 1),
            (1, Sex::Male, 54.0, 0, 51.9, 0),
            (1, Sex::Male, 40.0, 0, 27.7, 0),
            (2, Sex::Female, 27.0, 0, 11.1, 1),
            (2, Sex::Female, 14.0, 1, 30.1, 1),
            (2, Sex::Male, 35.0, 0, 26.0, 0),
            (2, Sex::Male, 28.0, 0, 13.0, 0),
            (3, Sex::Female, 26.0, 0, 7.9, 1),
            (3, Sex::Female, 27.0, 0, 11.1, 0),
            (3, Sex::Male, 22.0, 1, 7.3, 0),
            (3, Sex::Male, 35.0, 0, 8.1, 0),
            (3, Sex::Male, 20.0, 0, 7.2, 0),
            (3, Sex::Male, 25.0, 0, 7.9, 0),
            (3, Sex::Female, 31.0, 1, 18.0, 1),
        ] {
            records.push(base(pclass, sex, age, sibsp, fare));
            labels.push(survived);
        }

        // One record with everything missing that may be missing.
        let mut sparse = base(3, Sex::Male, 0.0, 0, 7.8);
        sparse.age = None;
        sparse.embark_town = None;
        sparse.deck = None;
        records.push(sparse);
        labels.push(0);

        (records, labels)
    }

    fn fitted() -> FittedPipeline {
        let (records, labels) = training_records();
        let frame = Frame::from_passengers(&records).expect("frame");
        SurvivalPipeline::new()
            .with_n_estimators(25)
            .with_max_depth(2)
            .fit(&frame, &labels)
            .expect("fit")
    }

    fn scenario_record() -> Passenger {
        Passenger::from_json(
            r#"{
                "pclass": 3, "sex": "male", "age": 22.0, "sibsp": 1, "parch": 0,
                "fare": 7.25, "embarked": "S", "class": "Third", "who": "man",
                "adult_male": true, "deck": "A", "embark_town": "Southampton",
                "alive": "no", "alone": false
            }"#,
        )
        .expect("scenario record")
    }

    #[test]
    fn test_fit_rejects_label_mismatch() {
        let (records, _) = training_records();
        let frame = Frame::from_passengers(&records).expect("frame");
        assert!(SurvivalPipeline::new().fit(&frame, &[0, 1]).is_err());
    }

    #[test]
    fn test_scenario_record_predicts_without_error() {
        let pipeline = fitted();
        let label = pipeline.predict(&scenario_record()).expect("predict");
        assert!(label <= 1);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let pipeline = fitted();
        let record = scenario_record();
        let first = pipeline.predict_with_proba(&record).expect("predict");
        for _ in 0..5 {
            assert_eq!(
                pipeline.predict_with_proba(&record).expect("predict"),
                first
            );
        }
    }

    #[test]
    fn test_predict_learns_survival_pattern() {
        let pipeline = fitted();
        let (records, labels) = training_records();
        let frame = Frame::from_passengers(&records).expect("frame");
        // The ensemble should fit this small separable-ish table well.
        let acc = pipeline.score(&frame, &labels).expect("score");
        assert!(acc >= 0.8, "training accuracy too low: {acc}");
    }

    #[test]
    fn test_predict_record_with_missing_nullable_fields() {
        let pipeline = fitted();
        let record = Passenger::from_json(
            r#"{"pclass": 3, "sex": "male", "sibsp": 0, "parch": 0, "fare": 7.9}"#,
        )
        .expect("record");
        // age, deck, embark_town all imputed; group (male, 3, alone) was
        // seen at fit time.
        let (label, proba) = pipeline.predict_with_proba(&record).expect("predict");
        assert!(label <= 1);
        assert!((0.0..=1.0).contains(&proba));
    }

    #[test]
    fn test_predict_proba_matches_label_threshold() {
        let pipeline = fitted();
        let (records, _) = training_records();
        let frame = Frame::from_passengers(&records).expect("frame");
        let labels = pipeline.predict_frame(&frame).expect("labels");
        let probas = pipeline.predict_proba(&frame).expect("probas");
        for (label, proba) in labels.iter().zip(probas) {
            assert_eq!(*label, usize::from(proba >= 0.5));
        }
    }

    #[test]
    fn test_feature_names_exposed() {
        let pipeline = fitted();
        let names = pipeline.feature_names().expect("names");
        assert!(names.contains(&"pclass".to_string()));
        assert!(names.iter().any(|n| n.starts_with("sex=")));
        assert_eq!(pipeline.n_features().expect("width"), names.len());
    }

    #[test]
    fn test_fitted_pipeline_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FittedPipeline>();
    }
}
