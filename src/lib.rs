//! Lifeboat: Titanic survival inference in pure Rust.
//!
//! A fitted preprocessing-and-classification pipeline behind a typed
//! API: imputation stages capture state at training time and replay it
//! at inference, a feature encoder produces a fixed-width matrix, and a
//! gradient-boosted ensemble yields the survival label. Fitted
//! pipelines persist as versioned, checksummed artifacts that serving
//! processes load read-only.
//!
//! # Quick Start
//!
//! ```
//! use lifeboat::prelude::*;
//!
//! # fn main() -> lifeboat::Result<()> {
//! // A tiny training table (the trainer binary reads the real CSV).
//! let records: Vec<Passenger> = (0..8)
//!     .map(|i| Passenger {
//!         pclass: if i % 2 == 0 { 3 } else { 1 },
//!         sex: if i % 2 == 0 { Sex::Male } else { Sex::Female },
//!         age: Some(20.0 + i as f32),
//!         sibsp: 0,
//!         parch: 0,
//!         fare: if i % 2 == 0 { 7.9 } else { 70.0 },
//!         embarked: None,
//!         class_name: None,
//!         who: Some(if i % 2 == 0 { Who::Man } else { Who::Woman }),
//!         adult_male: None,
//!         deck: None,
//!         embark_town: Some("Southampton".to_string()),
//!         alive: None,
//!         alone: None,
//!     })
//!     .collect();
//! let labels = vec![0, 1, 0, 1, 0, 1, 0, 1];
//!
//! let frame = Frame::from_passengers(&records)?;
//! let fitted = SurvivalPipeline::new().with_n_estimators(10).fit(&frame, &labels)?;
//!
//! let label = fitted.predict(&records[0])?;
//! assert!(label <= 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`data`]: passenger records, schema validation, column frames
//! - [`preprocessing`]: fitted imputers, column dropping, feature encoding
//! - [`tree`]: decision tree and gradient boosting classifiers
//! - [`pipeline`]: stage composition and the trained/untrained split
//! - [`serialization`]: the versioned pipeline artifact format
//! - [`service`]: the immutable inference handle serving layers hold
//! - [`metrics`]: evaluation metrics
//! - [`model_selection`]: train/test splitting
//! - [`dataset`]: Titanic CSV loading for the trainer
//! - [`primitives`]: the dense feature matrix

pub mod data;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model_selection;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod serialization;
pub mod service;
pub mod tree;

pub use error::{LifeboatError, Result};
pub use pipeline::{FittedPipeline, SurvivalPipeline};
pub use service::InferenceService;
