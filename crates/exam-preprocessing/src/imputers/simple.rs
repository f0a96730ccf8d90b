//! Statistical imputation of missing values.
//!
//! Numeric columns are filled with their training median, categorical
//! columns with their most frequent training value.

use crate::error::{PreprocessingError, Result};
use crate::traits::{FittedTransformer, Transformer};
use crate::utils::{
    column, median, missing_count, numeric_values, optional_float_column,
    optional_string_column, string_mode, string_values,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Statistic used to fill missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImputeStrategy {
    /// Median of the non-missing numeric values.
    #[default]
    Median,
    /// Most frequent non-missing value (works for any column type).
    MostFrequent,
}

/// Value learned for one column at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillValue::Number(v) => write!(f, "{:.2}", v),
            FillValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// Unfitted imputer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
}

impl SimpleImputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self { strategy }
    }

    /// Imputer filling numeric columns with the median.
    pub fn median() -> Self {
        Self::new(ImputeStrategy::Median)
    }

    /// Imputer filling columns with the most frequent value.
    pub fn most_frequent() -> Self {
        Self::new(ImputeStrategy::MostFrequent)
    }

    pub fn strategy(&self) -> ImputeStrategy {
        self.strategy
    }
}

impl Transformer for SimpleImputer {
    type Fitted = FittedSimpleImputer;

    fn name(&self) -> &'static str {
        "SimpleImputer"
    }

    fn fit(&self, df: &DataFrame) -> Result<FittedSimpleImputer> {
        let mut fill_values = Vec::with_capacity(df.width());

        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let name = series.name().to_string();

            let fill = match self.strategy {
                ImputeStrategy::Median => {
                    let values = numeric_values(series)?;
                    median(&values).map(FillValue::Number)
                }
                ImputeStrategy::MostFrequent => {
                    let values = string_values(series)?;
                    string_mode(&values).map(FillValue::Text)
                }
            }
            .ok_or_else(|| PreprocessingError::NoValidValues(name.clone()))?;

            debug!("Learned fill value {} for '{}'", fill, name);
            fill_values.push((name, fill));
        }

        Ok(FittedSimpleImputer {
            strategy: self.strategy,
            fill_values,
        })
    }
}

/// Imputer with one learned fill value per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedSimpleImputer {
    strategy: ImputeStrategy,
    fill_values: Vec<(String, FillValue)>,
}

impl FittedSimpleImputer {
    pub fn strategy(&self) -> ImputeStrategy {
        self.strategy
    }

    /// Learned fill value for `column`, if it was seen during fit.
    pub fn fill_value(&self, column: &str) -> Option<&FillValue> {
        self.fill_values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, fill)| fill)
    }
}

impl FittedTransformer for FittedSimpleImputer {
    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.fill_values.len());

        for (name, fill) in &self.fill_values {
            let series = column(df, name)?;

            let filled = match fill {
                FillValue::Number(value) => {
                    let values = numeric_values(series)?;
                    let missing = missing_count(&values);
                    if missing > 0 {
                        debug!("Filled {} values in '{}' with {}", missing, name, fill);
                    }
                    let values = values.into_iter().map(|v| Some(v.unwrap_or(*value))).collect();
                    optional_float_column(name, values)
                }
                FillValue::Text(value) => {
                    let values = string_values(series)?;
                    let missing = missing_count(&values);
                    if missing > 0 {
                        debug!("Filled {} values in '{}' with {}", missing, name, fill);
                    }
                    let values = values
                        .into_iter()
                        .map(|v| Some(v.unwrap_or_else(|| value.clone())))
                        .collect();
                    optional_string_column(name, values)
                }
            };
            columns.push(filled);
        }

        Ok(DataFrame::new(columns)?)
    }

    fn feature_names_in(&self) -> Vec<String> {
        self.fill_values.iter().map(|(name, _)| name.clone()).collect()
    }
}
