//! Column-dispatching transformer.
//!
//! Applies one [`Pipeline`] per named column group and concatenates the
//! group outputs column-wise, in group declaration order. Columns of the
//! input that belong to no group are dropped.

use crate::error::{PreprocessingError, Result, ResultExt};
use crate::pipeline::steps::{FittedPipeline, Pipeline};
use crate::traits::FittedTransformer;
use crate::utils::require_columns;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// A named pipeline together with the columns it is applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub name: String,
    pub pipeline: Pipeline,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedColumnGroup {
    name: String,
    columns: Vec<String>,
    pipeline: FittedPipeline,
}

/// Composed preprocessor.
///
/// Starts unfit; [`ColumnTransformer::fit`] populates the learned
/// parameters of every group. `transform` and `save` are only valid once
/// fitted.
///
/// # Example
///
/// ```rust,ignore
/// let mut preprocessor = ColumnTransformer::new()
///     .with_group("num_pipeline", numeric_pipeline, ["reading_score"])
///     .with_group("cat_pipeline", categorical_pipeline, ["gender", "lunch"]);
///
/// let train_features = preprocessor.fit_transform(&train_df)?;
/// let test_features = preprocessor.transform(&test_df)?;
/// preprocessor.save("artifacts/preprocessor.bin")?;
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnTransformer {
    groups: Vec<ColumnGroup>,
    fitted: Option<Vec<FittedColumnGroup>>,
}

// The transformer is handed between owners (builder, caller, persistence).
static_assertions::assert_impl_all!(ColumnTransformer: Send, Sync);

impl ColumnTransformer {
    /// Create a new transformer with no groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column group.
    pub fn with_group<I, S>(mut self, name: impl Into<String>, pipeline: Pipeline, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.push(ColumnGroup {
            name: name.into(),
            pipeline,
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Column groups in declaration order.
    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }

    /// Whether [`ColumnTransformer::fit`] has completed successfully.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Check group names are unique, every group has columns and a valid
    /// pipeline, and no column is claimed by two groups.
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(PreprocessingError::InvalidConfig(
                "column transformer has no column groups".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for group in &self.groups {
            if !names.insert(group.name.as_str()) {
                return Err(PreprocessingError::InvalidConfig(format!(
                    "duplicate column group '{}'",
                    group.name
                )));
            }
            if group.columns.is_empty() {
                return Err(PreprocessingError::InvalidConfig(format!(
                    "column group '{}' has no columns",
                    group.name
                )));
            }
            for col in &group.columns {
                if !columns.insert(col.as_str()) {
                    return Err(PreprocessingError::InvalidConfig(format!(
                        "column '{}' is assigned to more than one group",
                        col
                    )));
                }
            }
            group
                .pipeline
                .validate()
                .context(format!("Invalid pipeline for group '{}'", group.name))?;
        }
        Ok(())
    }

    /// Fit every group pipeline on its columns of `df`.
    ///
    /// Replaces any previously learned parameters. On error the transformer
    /// keeps its previous state.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.fit_groups(df)?;
        Ok(self)
    }

    /// Fit, then return the transformed training data.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let outputs = self.fit_groups(df)?;
        concat_columns(outputs)
    }

    fn fit_groups(&mut self, df: &DataFrame) -> Result<Vec<DataFrame>> {
        self.validate()?;
        info!(
            "Fitting preprocessor on {} rows, {} column groups",
            df.height(),
            self.groups.len()
        );

        let mut fitted = Vec::with_capacity(self.groups.len());
        let mut outputs = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            let input = select_group(df, &group.columns)
                .context(format!("Failed to select columns for '{}'", group.name))?;
            let (pipeline, out) = group
                .pipeline
                .fit_transform(&input)
                .context(format!("Failed to fit '{}'", group.name))?;

            debug!(
                "Fitted '{}': {} input columns -> {} output columns",
                group.name,
                group.columns.len(),
                out.width()
            );

            fitted.push(FittedColumnGroup {
                name: group.name.clone(),
                columns: group.columns.clone(),
                pipeline,
            });
            outputs.push(out);
        }

        check_unique_outputs(&fitted)?;
        self.fitted = Some(fitted);
        info!("Preprocessor fitted: {} output features", self.n_features_out()?);
        Ok(outputs)
    }

    /// Transform `df` with the learned parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessingError::NotFitted`] before `fit`, and
    /// [`PreprocessingError::ColumnNotFound`] when a schema column is absent.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let fitted = self.fitted_groups("transform")?;

        let mut outputs = Vec::with_capacity(fitted.len());
        for group in fitted {
            let input = select_group(df, &group.columns)
                .context(format!("Failed to select columns for '{}'", group.name))?;
            let out = group
                .pipeline
                .transform(&input)
                .context(format!("Failed to transform '{}'", group.name))?;
            outputs.push(out);
        }

        let out = concat_columns(outputs)?;
        debug!("Transformed {} rows into {} features", out.height(), out.width());
        Ok(out)
    }

    /// Output column names, in output order.
    pub fn feature_names_out(&self) -> Result<Vec<String>> {
        let fitted = self.fitted_groups("feature_names_out")?;
        Ok(fitted
            .iter()
            .flat_map(|g| g.pipeline.feature_names_out())
            .collect())
    }

    /// Number of output columns.
    pub fn n_features_out(&self) -> Result<usize> {
        self.feature_names_out().map(|names| names.len())
    }

    fn fitted_groups(&self, operation: &'static str) -> Result<&[FittedColumnGroup]> {
        self.fitted
            .as_deref()
            .ok_or(PreprocessingError::NotFitted(operation))
    }
}

fn check_unique_outputs(groups: &[FittedColumnGroup]) -> Result<()> {
    let mut seen = HashSet::new();
    for group in groups {
        for name in group.pipeline.feature_names_out() {
            if !seen.insert(name.clone()) {
                return Err(PreprocessingError::InvalidConfig(format!(
                    "output column '{}' is produced more than once (group '{}')",
                    name, group.name
                )));
            }
        }
    }
    Ok(())
}

fn select_group(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    require_columns(df, columns)?;
    Ok(df.select(columns.iter().map(String::as_str))?)
}

fn concat_columns(outputs: Vec<DataFrame>) -> Result<DataFrame> {
    let columns: Vec<Column> = outputs
        .into_iter()
        .flat_map(|df| df.take_columns())
        .collect();
    Ok(DataFrame::new(columns)?)
}
