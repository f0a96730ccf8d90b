//! End-to-end data transformation run.
//!
//! Builds the preprocessor, fits it on the training split, applies it to the
//! test split, and persists it. Both output matrices carry the target as
//! their last column.

use crate::config::PreprocessorConfig;
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::logging::{self, LogContext};
use crate::pipeline::{ColumnTransformer, PreprocessorBuilder};
use crate::utils::{column, numeric_values, optional_float_column};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Summary of a transformation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformationSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    /// Feature columns produced by the preprocessor (target excluded).
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub target_column: String,
    pub artifact_path: PathBuf,
}

/// Result of [`DataTransformation::initiate`].
#[derive(Debug, Clone)]
pub struct TransformationOutput {
    /// Transformed training features followed by the target.
    pub train: DataFrame,
    /// Transformed test features followed by the target.
    pub test: DataFrame,
    /// The fitted preprocessor, as saved.
    pub preprocessor: ColumnTransformer,
    pub artifact_path: PathBuf,
    pub summary: TransformationSummary,
}

/// Fits and persists the preprocessor for a train/test split.
///
/// # Example
///
/// ```rust,ignore
/// let output = DataTransformation::new(PreprocessorConfig::default())
///     .with_log_context(logs)
///     .from_csv("data/train.csv", "data/test.csv")?;
/// println!("{} features", output.summary.n_features);
/// ```
#[derive(Debug, Clone)]
pub struct DataTransformation {
    config: PreprocessorConfig,
    log_context: Option<LogContext>,
}

impl DataTransformation {
    pub fn new(config: PreprocessorConfig) -> Self {
        Self {
            config,
            log_context: None,
        }
    }

    pub fn with_log_context(mut self, context: LogContext) -> Self {
        self.log_context = Some(context);
        self
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    /// Read both splits from CSV files and run [`DataTransformation::initiate`].
    pub fn from_csv(
        &self,
        train_path: impl AsRef<Path>,
        test_path: impl AsRef<Path>,
    ) -> Result<TransformationOutput> {
        let train = read_csv(train_path)?;
        let test = read_csv(test_path)?;
        self.initiate(&train, &test)
    }

    /// Fit on `train`, transform `test`, and save the fitted preprocessor to
    /// the configured artifact path.
    ///
    /// # Errors
    ///
    /// Fails with [`PreprocessingError::ColumnNotFound`] if the target or a
    /// schema column is missing from either split, and with any stage error
    /// raised while fitting or transforming.
    pub fn initiate(&self, train: &DataFrame, test: &DataFrame) -> Result<TransformationOutput> {
        logging::scoped(self.log_context.as_ref(), || {
            let result = self.run(train, test);
            if let Err(e) = &result {
                error!("Data transformation failed: {}", e);
            }
            result
        })
    }

    fn run(&self, train: &DataFrame, test: &DataFrame) -> Result<TransformationOutput> {
        self.config.validate().map_err(PreprocessingError::from)?;
        let target = self.config.target_column.as_str();

        info!(
            "Read train ({} rows) and test ({} rows) data",
            train.height(),
            test.height()
        );

        let (train_features, train_target) =
            split_target(train, target).context("Failed to split train data")?;
        let (test_features, test_target) =
            split_target(test, target).context("Failed to split test data")?;

        info!("Obtaining preprocessing object");
        let mut builder = PreprocessorBuilder::new(self.config.clone());
        if let Some(context) = &self.log_context {
            builder = builder.with_log_context(context.clone());
        }
        let mut preprocessor = builder.build()?;

        info!("Applying preprocessing object on training and testing dataframes");
        let mut train_out = preprocessor
            .fit_transform(&train_features)
            .context("Failed to fit preprocessor on train data")?;
        let mut test_out = preprocessor
            .transform(&test_features)
            .context("Failed to transform test data")?;

        let feature_names = preprocessor.feature_names_out()?;
        if feature_names.iter().any(|name| name == target) {
            return Err(PreprocessingError::InvalidConfig(format!(
                "target column '{}' clashes with a preprocessed feature column",
                target
            )));
        }

        train_out.with_column(train_target)?;
        test_out.with_column(test_target)?;

        let artifact_path = self.config.artifact_path.clone();
        preprocessor.save(&artifact_path)?;
        info!("Saved preprocessing object to {}", artifact_path.display());

        let summary = TransformationSummary {
            train_rows: train_out.height(),
            test_rows: test_out.height(),
            n_features: feature_names.len(),
            feature_names,
            target_column: target.to_string(),
            artifact_path: artifact_path.clone(),
        };

        Ok(TransformationOutput {
            train: train_out,
            test: test_out,
            preprocessor,
            artifact_path,
            summary,
        })
    }
}

/// Separate the target from the feature columns, casting it to `f64`.
fn split_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Column)> {
    let values = numeric_values(column(df, target)?)?;
    let features = df.drop(target)?;
    Ok((features, optional_float_column(target, values)))
}

/// Tokens read as missing values, in addition to empty fields.
pub const CSV_NULL_VALUES: [&str; 4] = ["", "NA", "NaN", "null"];

/// Read a CSV file with a header row.
///
/// Fields matching [`CSV_NULL_VALUES`] are read as nulls so that a numeric
/// column with `NA` entries keeps its numeric type.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let null_values = NullValues::AllColumns(CSV_NULL_VALUES.iter().map(|v| (*v).into()).collect());
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_null_values(Some(null_values)))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .map_err(PreprocessingError::from)
        .context(format!("Failed to read {}", path.display()))?;
    Ok(df)
}

/// Write `df` as a CSV file with a header row, creating parent directories.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    info!("Dataset saved: {}", path.display());
    Ok(())
}
