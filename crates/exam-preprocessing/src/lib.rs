//! Exam Score Preprocessing Library
//!
//! Builds, fits, persists and reloads the feature preprocessor for the
//! student exam performance dataset, built with Rust and Polars.
//!
//! # Overview
//!
//! - **Numeric columns** are median-imputed, then standardized.
//! - **Categorical columns** are imputed with their most frequent value,
//!   one-hot encoded, then scaled without centering.
//! - The two pipelines are composed into a [`ColumnTransformer`] that can be
//!   saved to disk and reloaded with bit-identical behavior.
//! - Every run writes a timestamped log file through an explicit
//!   [`LogContext`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use exam_preprocessing::{LogContext, PreprocessorBuilder, PreprocessorConfig};
//!
//! let config = PreprocessorConfig::default();
//! let logs = LogContext::init(&config.logging)?;
//!
//! let mut preprocessor = PreprocessorBuilder::new(config.clone())
//!     .with_log_context(logs)
//!     .build()?;
//!
//! let train_features = preprocessor.fit_transform(&train_df)?;
//! let test_features = preprocessor.transform(&test_df)?;
//! preprocessor.save(&config.artifact_path)?;
//! ```
//!
//! # Full transformation run
//!
//! ```rust,ignore
//! use exam_preprocessing::{DataTransformation, PreprocessorConfig};
//!
//! let output = DataTransformation::new(PreprocessorConfig::default())
//!     .from_csv("data/train.csv", "data/test.csv")?;
//!
//! // Features followed by the target column
//! println!("{:?}", output.train.shape());
//! ```
//!
//! # Configuration
//!
//! Use [`PreprocessorConfig`] to choose the columns and output locations:
//!
//! ```rust,ignore
//! use exam_preprocessing::config::*;
//!
//! let config = PreprocessorConfig::builder()
//!     .numeric_columns(["reading_score"])
//!     .categorical_columns(["gender", "lunch"])
//!     .target_column("math_score")
//!     .artifact_path("artifacts/preprocessor.bin")
//!     .error_on_unknown_category(false)
//!     .build()?;
//! ```

pub mod artifact;
pub mod config;
pub mod encoders;
pub mod error;
pub mod imputers;
pub mod logging;
pub mod pipeline;
pub mod scalers;
pub mod traits;
pub mod transformation;
pub mod utils;

// Re-exports for convenient access
pub use artifact::{decode_artifact, encode_artifact};
pub use config::{
    ColumnSchema, ConfigValidationError, LoggingConfig, PreprocessorConfig,
    PreprocessorConfigBuilder,
};
pub use encoders::{FittedOneHotEncoder, HandleUnknown, OneHotEncoder};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use imputers::{FillValue, FittedSimpleImputer, ImputeStrategy, SimpleImputer};
pub use logging::LogContext;
pub use pipeline::{
    ColumnGroup, ColumnTransformer, FittedPipeline, FittedStep, Pipeline, PreprocessorBuilder,
    Step,
};
pub use scalers::{FittedStandardScaler, StandardScaler};
pub use traits::{FittedTransformer, Transformer};
pub use transformation::{DataTransformation, TransformationOutput, TransformationSummary};
