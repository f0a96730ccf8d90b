//! One-hot encoding for categorical features.
//!
//! Each input column becomes one `f64` indicator column per category seen
//! during fit, named `<column>_<category>`.

use crate::error::{PreprocessingError, Result};
use crate::traits::{FittedTransformer, Transformer};
use crate::utils::{column, float_column, missing_count, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// What to do with a category that was not seen during fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HandleUnknown {
    /// Fail the transform with [`PreprocessingError::UnknownCategory`].
    #[default]
    Error,
    /// Encode the row as all zeros for that column.
    Ignore,
}

/// Unfitted one-hot encoder.
///
/// # Example
///
/// ```rust,ignore
/// use exam_preprocessing::encoders::OneHotEncoder;
/// use exam_preprocessing::traits::{FittedTransformer, Transformer};
///
/// let df = df!["lunch" => ["standard", "free/reduced", "standard"]]?;
/// let fitted = OneHotEncoder::new().fit(&df)?;
///
/// // columns: lunch_free/reduced, lunch_standard
/// let encoded = fitted.transform(&df)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy for handling unknown categories.
    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }
}

impl Transformer for OneHotEncoder {
    type Fitted = FittedOneHotEncoder;

    fn name(&self) -> &'static str {
        "OneHotEncoder"
    }

    fn fit(&self, df: &DataFrame) -> Result<FittedOneHotEncoder> {
        let mut categories = Vec::with_capacity(df.width());

        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let name = series.name().to_string();
            let values = string_values(series)?;

            let missing = missing_count(&values);
            if missing > 0 {
                return Err(PreprocessingError::MissingValues {
                    column: name,
                    stage: self.name().to_string(),
                    count: missing,
                });
            }

            let distinct = sorted_categories(values);
            if distinct.is_empty() {
                return Err(PreprocessingError::NoValidValues(name));
            }

            debug!("Learned {} categories for '{}'", distinct.len(), name);
            categories.push((name, distinct));
        }

        let mut outputs = HashSet::new();
        for (name, cats) in &categories {
            for cat in cats {
                let output = indicator_name(name, cat);
                if !outputs.insert(output.clone()) {
                    return Err(PreprocessingError::InvalidConfig(format!(
                        "one-hot column '{}' is produced by more than one column/category pair",
                        output
                    )));
                }
            }
        }

        Ok(FittedOneHotEncoder {
            handle_unknown: self.handle_unknown,
            categories,
        })
    }
}

/// One-hot encoder with the sorted category vocabulary of each column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedOneHotEncoder {
    handle_unknown: HandleUnknown,
    categories: Vec<(String, Vec<String>)>,
}

impl FittedOneHotEncoder {
    /// Categories learned for `column`, sorted.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cats)| cats.as_slice())
    }

    /// Total number of indicator columns produced.
    pub fn n_features_out(&self) -> usize {
        self.categories.iter().map(|(_, cats)| cats.len()).sum()
    }

    fn encode_column(&self, name: &str, cats: &[String], df: &DataFrame) -> Result<Vec<Column>> {
        let values = string_values(column(df, name)?)?;

        let missing = missing_count(&values);
        if missing > 0 {
            return Err(PreprocessingError::MissingValues {
                column: name.to_string(),
                stage: "OneHotEncoder".to_string(),
                count: missing,
            });
        }

        let index: HashMap<&str, usize> = cats
            .iter()
            .enumerate()
            .map(|(i, cat)| (cat.as_str(), i))
            .collect();
        let mut indicators = vec![vec![0.0_f64; values.len()]; cats.len()];

        for (row, value) in values.iter().flatten().enumerate() {
            match index.get(value.as_str()) {
                Some(&i) => indicators[i][row] = 1.0,
                None => match self.handle_unknown {
                    HandleUnknown::Error => {
                        return Err(PreprocessingError::UnknownCategory {
                            column: name.to_string(),
                            value: value.clone(),
                        });
                    }
                    HandleUnknown::Ignore => {
                        debug!("Ignoring unknown category '{}' in '{}'", value, name);
                    }
                },
            }
        }

        Ok(cats
            .iter()
            .zip(indicators)
            .map(|(cat, values)| float_column(&indicator_name(name, cat), values))
            .collect())
    }
}

/// Distinct categories in ascending order. Numeric order is used when every
/// category parses as a number, so integer codes sort as 1, 2, 10.
fn sorted_categories(values: Vec<Option<String>>) -> Vec<String> {
    let distinct: Vec<String> = values
        .into_iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let keys: Option<Vec<f64>> = distinct.iter().map(|c| c.parse::<f64>().ok()).collect();
    match keys {
        Some(keys) => {
            let mut keyed: Vec<(f64, String)> = keys.into_iter().zip(distinct).collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            keyed.into_iter().map(|(_, cat)| cat).collect()
        }
        None => distinct,
    }
}

fn indicator_name(column: &str, category: &str) -> String {
    format!("{}_{}", column, category)
}

impl FittedTransformer for FittedOneHotEncoder {
    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.n_features_out());
        for (name, cats) in &self.categories {
            columns.extend(self.encode_column(name, cats, df)?);
        }
        Ok(DataFrame::new(columns)?)
    }

    fn feature_names_in(&self) -> Vec<String> {
        self.categories.iter().map(|(name, _)| name.clone()).collect()
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(name, cats)| cats.iter().map(move |cat| indicator_name(name, cat)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column_values(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    fn sample() -> DataFrame {
        df![
            "gender" => ["female", "male", "female"],
            "lunch" => ["standard", "free/reduced", "standard"],
        ]
        .unwrap()
    }

    #[test]
    fn test_fit_learns_sorted_categories() {
        let fitted = OneHotEncoder::new().fit(&sample()).unwrap();

        assert_eq!(
            fitted.categories("lunch").unwrap(),
            &["free/reduced".to_string(), "standard".to_string()]
        );
        assert_eq!(fitted.n_features_out(), 4);
        assert_eq!(
            fitted.feature_names_out(),
            vec![
                "gender_female",
                "gender_male",
                "lunch_free/reduced",
                "lunch_standard"
            ]
        );
    }

    #[test]
    fn test_transform_produces_indicators() {
        let (_, out) = OneHotEncoder::new().fit_transform(&sample()).unwrap();

        assert_eq!(out.width(), 4);
        assert_eq!(column_values(&out, "gender_female"), vec![1.0, 0.0, 1.0]);
        assert_eq!(column_values(&out, "gender_male"), vec![0.0, 1.0, 0.0]);
        assert_eq!(column_values(&out, "lunch_standard"), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_category_errors_by_default() {
        let fitted = OneHotEncoder::new().fit(&sample()).unwrap();
        let test = df![
            "gender" => ["other"],
            "lunch" => ["standard"],
        ]
        .unwrap();

        let err = fitted.transform(&test).unwrap_err();
        assert!(matches!(
            err,
            PreprocessingError::UnknownCategory { ref column, ref value }
                if column == "gender" && value == "other"
        ));
    }

    #[test]
    fn test_unknown_category_ignored() {
        let fitted = OneHotEncoder::new()
            .with_handle_unknown(HandleUnknown::Ignore)
            .fit(&sample())
            .unwrap();
        let test = df![
            "gender" => ["other", "male"],
            "lunch" => ["standard", "standard"],
        ]
        .unwrap();

        let out = fitted.transform(&test).unwrap();
        assert_eq!(column_values(&out, "gender_female"), vec![0.0, 0.0]);
        assert_eq!(column_values(&out, "gender_male"), vec![0.0, 1.0]);
    }

    #[test]
    fn test_missing_values_rejected() {
        let df = df!["lunch" => [Some("standard"), None]].unwrap();
        let err = OneHotEncoder::new().fit(&df).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_VALUES");
    }

    #[test]
    fn test_integer_codes_sort_numerically() {
        let df = df!["level" => [10i64, 2, 1, 2]].unwrap();
        let fitted = OneHotEncoder::new().fit(&df).unwrap();

        assert_eq!(fitted.feature_names_out(), vec!["level_1", "level_2", "level_10"]);
    }

    #[test]
    fn test_numeric_strings_sort_numerically() {
        let df = df!["level" => ["10", "9", "100"]].unwrap();
        let fitted = OneHotEncoder::new().fit(&df).unwrap();

        assert_eq!(
            fitted.categories("level").unwrap(),
            &["9".to_string(), "10".to_string(), "100".to_string()]
        );
    }

    #[test]
    fn test_colliding_indicator_names_rejected() {
        let df = df![
            "a" => ["b_c"],
            "a_b" => ["c"],
        ]
        .unwrap();

        let err = OneHotEncoder::new().fit(&df).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(err.to_string().contains("a_b_c"));
    }
}
