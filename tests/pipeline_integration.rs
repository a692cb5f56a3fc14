//! End-to-end pipeline tests: fit, serve, persist, reload.

use lifeboat::data::{Frame, Passenger, Sex, Who};
use lifeboat::error::LifeboatError;
use lifeboat::pipeline::{FittedPipeline, SurvivalPipeline};
use lifeboat::serialization::{self, load_pipeline, save_pipeline, FORMAT_VERSION};
use lifeboat::service::InferenceService;

fn passenger(pclass: u8, sex: Sex, age: Option<f32>, sibsp: u32, fare: f32) -> Passenger {
    Passenger {
        pclass,
        sex,
        age,
        sibsp,
        parch: 0,
        fare,
        embarked: None,
        class_name: None,
        who: Some(match sex {
            Sex::Male => Who::Man,
            Sex::Female => Who::Woman,
        }),
        adult_male: None,
        deck: if pclass == 1 { Some("C".to_string()) } else { None },
        embark_town: Some(
            if fare > 50.0 { "Cherbourg" } else { "Southampton" }.to_string(),
        ),
        alive: None,
        alone: None,
    }
}

fn training_data() -> (Vec<Passenger>, Vec<usize>) {
    let rows = [
        (1, Sex::Female, Some(38.0), 1, 71.3, 1),
        (1, Sex::Female, Some(35.0), 1, 53.1, 1),
        (1, Sex::Female, Some(58.0), 0, 26.6, 1),
        (1, Sex::Male, Some(54.0), 0, 51.9, 0),
        (1, Sex::Male, Some(40.0), 0, 27.7, 1),
        (2, Sex::Female, Some(27.0), 0, 11.1, 1),
        (2, Sex::Female, Some(24.0), 1, 26.0, 1),
        (2, Sex::Male, Some(35.0), 0, 26.0, 0),
        (2, Sex::Male, Some(28.0), 0, 13.0, 0),
        (3, Sex::Female, Some(26.0), 0, 7.9, 1),
        (3, Sex::Female, Some(31.0), 1, 18.0, 0),
        (3, Sex::Male, Some(22.0), 1, 7.3, 0),
        (3, Sex::Male, Some(35.0), 0, 8.1, 0),
        (3, Sex::Male, None, 0, 7.2, 0),
        (3, Sex::Male, Some(25.0), 0, 7.9, 0),
        (3, Sex::Female, Some(18.0), 0, 7.8, 1),
    ];
    let records = rows
        .iter()
        .map(|&(pclass, sex, age, sibsp, fare, _)| passenger(pclass, sex, age, sibsp, fare))
        .collect();
    let labels = rows.iter().map(|&(.., survived)| survived).collect();
    (records, labels)
}

fn fit_pipeline() -> (FittedPipeline, Frame, Vec<usize>) {
    let (records, labels) = training_data();
    let frame = Frame::from_passengers(&records).expect("frame");
    let fitted = SurvivalPipeline::new()
        .with_n_estimators(30)
        .with_max_depth(2)
        .fit(&frame, &labels)
        .expect("fit");
    (fitted, frame, labels)
}

const SCENARIO: &str = r#"{
    "pclass": 3, "sex": "male", "age": 22.0, "sibsp": 1, "parch": 0,
    "fare": 7.25, "embarked": "S", "class": "Third", "who": "man",
    "adult_male": true, "deck": "A", "embark_town": "Southampton",
    "alive": "no", "alone": false
}"#;

#[test]
fn save_and_reload_yields_identical_predictions() {
    let (fitted, frame, _) = fit_pipeline();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("titanic_pipeline.lfb");
    save_pipeline(&path, &fitted).expect("save");

    let (reloaded, metadata) = load_pipeline(&path).expect("load");

    let original_labels = fitted.predict_frame(&frame).expect("predict");
    let reloaded_labels = reloaded.predict_frame(&frame).expect("predict");
    assert_eq!(original_labels, reloaded_labels);

    // Probabilities survive the round trip bit-for-bit, not just the
    // thresholded labels.
    let original_probas = fitted.predict_proba(&frame).expect("proba");
    let reloaded_probas = reloaded.predict_proba(&frame).expect("proba");
    assert_eq!(original_probas, reloaded_probas);

    assert_eq!(
        metadata.get("format").and_then(|v| v.as_str()),
        Some("lifeboat.survival-pipeline")
    );
    assert_eq!(
        metadata.get("n_features").and_then(|v| v.as_u64()),
        Some(fitted.n_features().expect("width") as u64)
    );
}

#[test]
fn corrupted_artifact_fails_checksum() {
    let (fitted, _, _) = fit_pipeline();
    let mut bytes = serialization::to_bytes(&fitted).expect("bytes");

    // Flip one payload byte; the trailing CRC must catch it.
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xFF;

    assert!(matches!(
        serialization::from_bytes(&bytes),
        Err(LifeboatError::ChecksumMismatch { .. })
    ));
}

#[test]
fn future_version_artifact_is_rejected() {
    let (fitted, _, _) = fit_pipeline();
    let mut bytes = serialization::to_bytes(&fitted).expect("bytes");

    // Patch the version field and recompute the checksum so only the
    // version gate can object.
    let next = (FORMAT_VERSION + 1).to_le_bytes();
    bytes[4] = next[0];
    bytes[5] = next[1];
    let body_len = bytes.len() - 4;
    let crc = serialization::crc32(&bytes[..body_len]);
    bytes[body_len..].copy_from_slice(&crc.to_le_bytes());

    match serialization::from_bytes(&bytes) {
        Err(LifeboatError::UnsupportedVersion { found, supported }) => {
            assert_eq!(found, FORMAT_VERSION + 1);
            assert_eq!(supported, FORMAT_VERSION);
        }
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
}

#[test]
fn truncated_artifact_is_rejected() {
    let (fitted, _, _) = fit_pipeline();
    let bytes = serialization::to_bytes(&fitted).expect("bytes");
    let result = serialization::from_bytes(&bytes[..bytes.len() - 10]);
    assert!(result.is_err());
}

#[test]
fn missing_artifact_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = load_pipeline(dir.path().join("absent.lfb"));
    assert!(matches!(result, Err(LifeboatError::Io(_))));
}

#[test]
fn service_answers_scenario_request() {
    let (fitted, _, _) = fit_pipeline();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("model.lfb");
    save_pipeline(&path, &fitted).expect("save");

    let service = InferenceService::open(&path).expect("open");
    let prediction = service.predict_json(SCENARIO).expect("predict");
    assert!(prediction.label <= 1);
    assert!((0.0..=1.0).contains(&prediction.probability));
}

#[test]
fn service_rejects_missing_field_and_keeps_serving() {
    let (fitted, _, _) = fit_pipeline();
    let service = InferenceService::from_pipeline(fitted).expect("service");

    let body = r#"{"pclass": 3, "sibsp": 1, "parch": 0, "fare": 7.25}"#;
    match service.predict_json(body) {
        Err(LifeboatError::Schema { field, .. }) => assert_eq!(field, "sex"),
        other => panic!("expected Schema error, got {other:?}"),
    }

    // The same handle still answers valid requests afterwards.
    assert!(service.predict_json(SCENARIO).is_ok());
}

#[test]
fn whole_pipeline_is_deterministic_across_calls() {
    let (fitted, frame, _) = fit_pipeline();
    let first = fitted.predict_frame(&frame).expect("predict");
    for _ in 0..3 {
        assert_eq!(fitted.predict_frame(&frame).expect("predict"), first);
    }
}
