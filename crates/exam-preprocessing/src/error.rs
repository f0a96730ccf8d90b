//! Custom error types for the preprocessing pipeline.
//!
//! This module provides a single error hierarchy using `thiserror` so that
//! every failure in building, fitting, transforming or persisting a
//! preprocessor reaches the caller as one domain error.
//!
//! Errors are serializable as `{ code, message }`, which is what the CLI
//! prints in `--json` mode.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::panic::Location;
use thiserror::Error;

/// The main error type for the preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// A transform (or save) was requested before the transformer was fitted.
    #[error("This transformer is not fitted yet; call `fit` before `{0}`")]
    NotFitted(&'static str),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// A stage that cannot handle missing values received some.
    #[error("Column '{column}' contains {count} missing values; impute before '{stage}'")]
    MissingValues {
        column: String,
        stage: String,
        count: usize,
    },

    /// A category that was not seen during fit appeared at transform time.
    #[error("Found unknown category '{value}' in column '{column}' during transform")]
    UnknownCategory { column: String, value: String },

    /// Type conversion failed.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Artifact encoding error.
    #[error("Failed to encode artifact: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Artifact decoding error.
    #[error("Failed to decode artifact: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// Wrapped error with the context and source location of the failure.
    #[error("{context} (at {location}): {source}")]
    WithContext {
        context: String,
        location: &'static Location<'static>,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Add context to an error, recording the caller's source location.
    #[track_caller]
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            location: Location::caller(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFitted(_) => "NOT_FITTED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::MissingValues { .. } => "MISSING_VALUES",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error (or the error it wraps) is a "not fitted" error.
    pub fn is_not_fitted(&self) -> bool {
        match self {
            Self::NotFitted(_) => true,
            Self::WithContext { source, .. } => source.is_not_fitted(),
            _ => false,
        }
    }

    /// Innermost error, skipping any context wrappers.
    pub fn root_cause(&self) -> &PreprocessingError {
        match self {
            Self::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[track_caller]
    fn context(self, context: impl Into<String>) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| PreprocessingError::WithContext {
            context: context.into(),
            location,
            source: Box::new(e),
        })
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    #[track_caller]
    fn context(self, context: impl Into<String>) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| PreprocessingError::WithContext {
            context: context.into(),
            location,
            source: Box::new(PreprocessingError::Polars(e)),
        })
    }
}
