//! Construction of the exam preprocessor.
//!
//! [`PreprocessorBuilder`] turns a [`PreprocessorConfig`] into an unfit
//! [`ColumnTransformer`] with a numeric and a categorical pipeline.

use crate::config::{ColumnSchema, PreprocessorConfig};
use crate::encoders::{HandleUnknown, OneHotEncoder};
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::imputers::SimpleImputer;
use crate::logging::{self, LogContext};
use crate::pipeline::{ColumnTransformer, Pipeline};
use crate::scalers::StandardScaler;
use tracing::{error, info};

/// Name of the numeric column group.
pub const NUMERIC_GROUP: &str = "num_pipeline";

/// Name of the categorical column group.
pub const CATEGORICAL_GROUP: &str = "cat_pipeline";

/// Builds the unfit preprocessor from a configuration.
///
/// # Example
///
/// ```rust,ignore
/// use exam_preprocessing::{PreprocessorBuilder, PreprocessorConfig};
///
/// let mut preprocessor = PreprocessorBuilder::new(PreprocessorConfig::default())
///     .with_log_context(logs)
///     .build()?;
/// let features = preprocessor.fit_transform(&train_df)?;
/// ```
#[derive(Debug, Clone)]
pub struct PreprocessorBuilder {
    config: PreprocessorConfig,
    log_context: Option<LogContext>,
}

impl PreprocessorBuilder {
    pub fn new(config: PreprocessorConfig) -> Self {
        Self {
            config,
            log_context: None,
        }
    }

    /// Emit build logs into `context`.
    pub fn with_log_context(mut self, context: LogContext) -> Self {
        self.log_context = Some(context);
        self
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    /// Median imputation followed by standardization.
    pub fn numeric_pipeline(&self) -> Pipeline {
        Pipeline::new()
            .step("imputer", SimpleImputer::median())
            .step("scaler", StandardScaler::new())
    }

    /// Mode imputation, one-hot encoding, then scaling without centering.
    pub fn categorical_pipeline(&self) -> Pipeline {
        let handle_unknown = if self.config.error_on_unknown_category {
            HandleUnknown::Error
        } else {
            HandleUnknown::Ignore
        };

        Pipeline::new()
            .step("imputer", SimpleImputer::most_frequent())
            .step(
                "onehotencoder",
                OneHotEncoder::new().with_handle_unknown(handle_unknown),
            )
            .step("scaler", StandardScaler::new().with_mean(false))
    }

    /// Build the unfit column transformer.
    ///
    /// Groups with no columns are left out. Nothing is fitted here.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessingError::WithContext`] wrapping the underlying
    /// failure when the schema or a pipeline is invalid.
    pub fn build(&self) -> Result<ColumnTransformer> {
        logging::scoped(self.log_context.as_ref(), || {
            let result = self.build_transformer();
            match &result {
                Ok(transformer) => info!(
                    "Preprocessor object created with {} column groups",
                    transformer.groups().len()
                ),
                Err(e) => error!("Failed to build preprocessor: {}", e),
            }
            result
        })
    }

    fn build_transformer(&self) -> Result<ColumnTransformer> {
        let schema: &ColumnSchema = &self.config.schema;
        schema
            .validate()
            .map_err(PreprocessingError::from)
            .context("Failed to validate column schema")?;

        info!("Numerical columns: {:?}", schema.numeric_columns);
        info!("Categorical columns: {:?}", schema.categorical_columns);

        let mut transformer = ColumnTransformer::new();
        if !schema.numeric_columns.is_empty() {
            transformer = transformer.with_group(
                NUMERIC_GROUP,
                self.numeric_pipeline(),
                schema.numeric_columns.iter().cloned(),
            );
        }
        if !schema.categorical_columns.is_empty() {
            transformer = transformer.with_group(
                CATEGORICAL_GROUP,
                self.categorical_pipeline(),
                schema.categorical_columns.iter().cloned(),
            );
        }

        transformer
            .validate()
            .context("Failed to compose column transformer")?;
        Ok(transformer)
    }
}
