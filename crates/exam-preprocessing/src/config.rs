//! Configuration types for the preprocessing pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic preprocessor setup.

use crate::error::PreprocessingError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default numeric feature columns of the exam dataset.
pub const DEFAULT_NUMERIC_COLUMNS: [&str; 2] = ["writing_score", "reading_score"];

/// Default categorical feature columns of the exam dataset.
pub const DEFAULT_CATEGORICAL_COLUMNS: [&str; 5] = [
    "gender",
    "race_ethnicity",
    "parental_level_of_education",
    "lunch",
    "test_preparation_course",
];

/// Default prediction target, split off before preprocessing.
pub const DEFAULT_TARGET_COLUMN: &str = "math_score";

/// The two ordered column groups the preprocessor touches.
///
/// Columns outside the union of both groups are ignored by the transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Columns imputed with the median and standardized.
    pub numeric_columns: Vec<String>,
    /// Columns imputed with the mode, one-hot encoded and scaled.
    pub categorical_columns: Vec<String>,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            numeric_columns: DEFAULT_NUMERIC_COLUMNS.iter().map(|s| s.to_string()).collect(),
            categorical_columns: DEFAULT_CATEGORICAL_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ColumnSchema {
    /// Create a schema from explicit column lists.
    pub fn new<N, C>(numeric: N, categorical: C) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            numeric_columns: numeric.into_iter().map(Into::into).collect(),
            categorical_columns: categorical.into_iter().map(Into::into).collect(),
        }
    }

    /// All schema columns, numeric first.
    pub fn all_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric_columns
            .iter()
            .chain(self.categorical_columns.iter())
            .map(String::as_str)
    }

    /// Validate that the groups are well-formed and disjoint.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.numeric_columns.is_empty() && self.categorical_columns.is_empty() {
            return Err(ConfigValidationError::EmptySchema);
        }

        let mut seen = HashSet::new();
        for name in self.all_columns() {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName);
            }
            if !seen.insert(name) {
                return Err(ConfigValidationError::DuplicateColumn(name.to_string()));
            }
        }

        Ok(())
    }
}

/// Configuration for the per-process log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory the log file is created in.
    /// Default: "logs"
    pub log_dir: PathBuf,

    /// Filter directive for the log file (`RUST_LOG` takes precedence).
    /// Default: "info"
    pub level: String,

    /// Mirror log lines to stderr.
    /// Default: false
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            level: "info".to_string(),
            console: false,
        }
    }
}

/// Configuration for building and persisting the preprocessor.
///
/// Use [`PreprocessorConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use exam_preprocessing::config::{ColumnSchema, PreprocessorConfig};
///
/// let config = PreprocessorConfig::builder()
///     .schema(ColumnSchema::new(["age"], ["city"]))
///     .artifact_path("artifacts/city_preprocessor.bin")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    /// Feature columns and their groups.
    /// Default: the exam dataset schema
    pub schema: ColumnSchema,

    /// Where the fitted preprocessor is written.
    /// Default: "artifacts/preprocessor.bin"
    pub artifact_path: PathBuf,

    /// Target column removed from the features before fitting.
    /// Default: "math_score"
    pub target_column: String,

    /// Whether unseen categories at transform time are an error.
    /// When false, they encode as all-zero indicators.
    /// Default: true
    pub error_on_unknown_category: bool,

    /// Log file settings.
    pub logging: LoggingConfig,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            schema: ColumnSchema::default(),
            artifact_path: default_artifact_path(),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            error_on_unknown_category: true,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_artifact_path() -> PathBuf {
    Path::new("artifacts").join("preprocessor.bin")
}

impl PreprocessorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PreprocessorConfigBuilder {
        PreprocessorConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PreprocessingError> {
        let text = std::fs::read_to_string(path)?;
        let config: PreprocessorConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.schema.validate()?;

        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTargetColumn);
        }

        if self.schema.all_columns().any(|c| c == self.target_column) {
            return Err(ConfigValidationError::TargetInSchema(
                self.target_column.clone(),
            ));
        }

        if self.artifact_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyArtifactPath);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Column schema has no numeric or categorical columns")]
    EmptySchema,

    #[error("Column schema contains an empty column name")]
    EmptyColumnName,

    #[error("Column '{0}' appears more than once in the column schema")]
    DuplicateColumn(String),

    #[error("Target column name must not be empty")]
    EmptyTargetColumn,

    #[error("Target column '{0}' is also listed as a feature column")]
    TargetInSchema(String),

    #[error("Artifact path must not be empty")]
    EmptyArtifactPath,
}

impl From<ConfigValidationError> for PreprocessingError {
    fn from(err: ConfigValidationError) -> Self {
        PreprocessingError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PreprocessorConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PreprocessorConfigBuilder {
    schema: Option<ColumnSchema>,
    artifact_path: Option<PathBuf>,
    target_column: Option<String>,
    error_on_unknown_category: Option<bool>,
    logging: Option<LoggingConfig>,
}

impl PreprocessorConfigBuilder {
    /// Set the column schema.
    pub fn schema(mut self, schema: ColumnSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the numeric columns, keeping the categorical ones.
    pub fn numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schema = self.schema.get_or_insert_with(ColumnSchema::default);
        schema.numeric_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the categorical columns, keeping the numeric ones.
    pub fn categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schema = self.schema.get_or_insert_with(ColumnSchema::default);
        schema.categorical_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set where the fitted preprocessor is saved.
    pub fn artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }

    /// Set the target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Choose whether unseen categories fail the transform.
    pub fn error_on_unknown_category(mut self, error: bool) -> Self {
        self.error_on_unknown_category = Some(error);
        self
    }

    /// Set the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PreprocessorConfig` or an error if validation fails.
    pub fn build(self) -> Result<PreprocessorConfig, ConfigValidationError> {
        let config = PreprocessorConfig {
            schema: self.schema.unwrap_or_default(),
            artifact_path: self.artifact_path.unwrap_or_else(default_artifact_path),
            target_column: self
                .target_column
                .unwrap_or_else(|| DEFAULT_TARGET_COLUMN.to_string()),
            error_on_unknown_category: self.error_on_unknown_category.unwrap_or(true),
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
