//! Error types for lifeboat operations.
//!
//! One enum covers the whole taxonomy: request validation, degenerate
//! training data, imputation lookup misses, and artifact loading.

use std::fmt;

use crate::data::Sex;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LifeboatError>;

/// Main error type for lifeboat operations.
///
/// # Examples
///
/// ```
/// use lifeboat::error::LifeboatError;
///
/// let err = LifeboatError::Schema {
///     field: "sex".to_string(),
///     message: "missing required field 'sex'".to_string(),
/// };
/// assert!(err.to_string().contains("sex"));
/// ```
#[derive(Debug)]
pub enum LifeboatError {
    /// An inference request is missing a required field or carries a
    /// malformed value. Recoverable per-request.
    Schema {
        /// Offending field name ("body" when the whole payload is bad)
        field: String,
        /// What was wrong with it
        message: String,
    },

    /// Training data is insufficient or degenerate for fitting a stage
    /// (e.g. `embark_town` entirely null).
    Fit {
        /// Fit failure description
        message: String,
    },

    /// An age-imputation group key was never observed during fit and the
    /// imputer's policy is to fail rather than fall back.
    UnseenGroup {
        /// Sex component of the group key
        sex: Sex,
        /// Passenger class component of the group key
        pclass: u8,
        /// Traveling-alone component of the group key
        alone: bool,
    },

    /// `transform` or `predict` called on a component before `fit`.
    NotFitted {
        /// Component name
        component: &'static str,
    },

    /// Malformed artifact or dataset bytes.
    Format {
        /// Error description
        message: String,
    },

    /// Artifact format version not supported by this reader.
    UnsupportedVersion {
        /// Version found in the artifact header
        found: u16,
        /// Version this reader supports
        supported: u16,
    },

    /// Artifact checksum verification failed.
    ChecksumMismatch {
        /// Expected checksum
        expected: u32,
        /// Actual checksum
        actual: u32,
    },

    /// I/O failure loading or saving an artifact.
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for LifeboatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeboatError::Schema { field, message } => {
                write!(f, "Invalid request field '{field}': {message}")
            }
            LifeboatError::Fit { message } => write!(f, "Fit failed: {message}"),
            LifeboatError::UnseenGroup { sex, pclass, alone } => {
                write!(
                    f,
                    "No fitted age statistic for group (sex={sex}, pclass={pclass}, alone={alone})"
                )
            }
            LifeboatError::NotFitted { component } => {
                write!(f, "{component} not fitted. Call fit() first.")
            }
            LifeboatError::Format { message } => write!(f, "Invalid format: {message}"),
            LifeboatError::UnsupportedVersion { found, supported } => {
                write!(
                    f,
                    "Unsupported artifact version: found {found}, this reader supports {supported}"
                )
            }
            LifeboatError::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "Checksum mismatch: expected 0x{expected:08X}, got 0x{actual:08X}"
                )
            }
            LifeboatError::Io(e) => write!(f, "I/O error: {e}"),
            LifeboatError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LifeboatError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for LifeboatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LifeboatError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LifeboatError {
    fn from(err: std::io::Error) -> Self {
        LifeboatError::Io(err)
    }
}

impl From<&str> for LifeboatError {
    fn from(msg: &str) -> Self {
        LifeboatError::Other(msg.to_string())
    }
}

impl From<String> for LifeboatError {
    fn from(msg: String) -> Self {
        LifeboatError::Other(msg)
    }
}
