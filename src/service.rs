//! Inference service handle.
//!
//! An [`InferenceService`] is constructed once from a persisted artifact
//! and holds the loaded pipeline read-only for the process lifetime.
//! Request handlers receive it by reference; there is no ambient global
//! model state. A load failure is surfaced to the caller, which has no
//! degraded mode to fall back to.

use std::path::Path;

use serde::Serialize;

use crate::data::Passenger;
use crate::error::Result;
use crate::pipeline::FittedPipeline;
use crate::serialization::{self, ArtifactMetadata};

/// One prediction response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// Survival label: 0 or 1
    pub label: usize,
    /// Probability of survival
    pub probability: f32,
}

/// Immutable inference handle over a loaded pipeline artifact.
///
/// Everything is `&self` and owned data: the service is `Send + Sync`
/// and concurrent requests need no coordination.
#[derive(Debug)]
pub struct InferenceService {
    pipeline: FittedPipeline,
    metadata: ArtifactMetadata,
}

impl InferenceService {
    /// Loads the artifact at `path` and builds the service.
    ///
    /// This is the single blocking load at process startup.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file is unreadable, or the artifact
    /// validation errors (`Format`, `UnsupportedVersion`,
    /// `ChecksumMismatch`). The caller must not serve requests on error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (pipeline, metadata) = serialization::load_pipeline(path)?;
        Ok(Self { pipeline, metadata })
    }

    /// Builds a service around an already fitted pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline's metadata cannot be derived.
    pub fn from_pipeline(pipeline: FittedPipeline) -> Result<Self> {
        let metadata = serialization::build_metadata(&pipeline)?;
        Ok(Self { pipeline, metadata })
    }

    /// Predicts for one validated record.
    ///
    /// # Errors
    ///
    /// Returns `Schema` for an out-of-domain record, or a stage error.
    pub fn predict(&self, passenger: &Passenger) -> Result<Prediction> {
        let (label, probability) = self.pipeline.predict_with_proba(passenger)?;
        Ok(Prediction { label, probability })
    }

    /// Parses a JSON request body and predicts.
    ///
    /// Schema errors are recoverable: the caller reports them and keeps
    /// serving.
    ///
    /// # Errors
    ///
    /// Returns `Schema` for a malformed body, or a stage error.
    pub fn predict_json(&self, body: &str) -> Result<Prediction> {
        let passenger = Passenger::from_json(body)?;
        self.predict(&passenger)
    }

    /// The loaded artifact's metadata.
    #[must_use]
    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    /// The loaded pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }
}
