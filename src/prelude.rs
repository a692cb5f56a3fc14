//! Convenience re-exports.
//!
//! ```
//! use lifeboat::prelude::*;
//! ```

pub use crate::data::{Column, Frame, Passenger, Sex, Who};
pub use crate::error::{LifeboatError, Result};
pub use crate::pipeline::{FittedPipeline, SurvivalPipeline};
pub use crate::preprocessing::UnseenAgePolicy;
pub use crate::primitives::Matrix;
pub use crate::serialization::{load_pipeline, save_pipeline};
pub use crate::service::{InferenceService, Prediction};
pub use crate::tree::GradientBoostingClassifier;
