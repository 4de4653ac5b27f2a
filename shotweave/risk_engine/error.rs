use std::path::PathBuf;

use thiserror::Error;

/// Caller-caused rejection. The only error kind that crosses the engine boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Breakdown requested without any script text.
    #[error("No script text provided.")]
    EmptyScript,
    /// A supplied operational field is not a number.
    #[error("Invalid numerical data for risk prediction: `{field}` is not numeric.")]
    NonNumeric {
        /// Offending field name.
        field: &'static str,
    },
    /// A supplied operational field parsed to NaN or infinity.
    #[error("Invalid numerical data for risk prediction: `{field}` is not finite.")]
    NonFinite {
        /// Offending field name.
        field: &'static str,
    },
    /// The request body is not a JSON object, or a field has the wrong shape.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

/// Failures in training or persisting the overrun model. Recovered locally as "no model".
#[derive(Debug, Error)]
pub enum ModelError {
    /// Fitting could not produce a usable model.
    #[error("training failed: {0}")]
    Training(String),
    /// Reading or writing the artifact failed.
    #[error("model persistence failed for {path}: {source}")]
    Persistence {
        /// Artifact location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The artifact exists but cannot be trusted.
    #[error("persisted model at {path} is corrupt: {reason}")]
    Corrupt {
        /// Artifact location.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },
}

impl ModelError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
