//! Ordered chains of preprocessing stages.
//!
//! A [`Pipeline`] applies its named steps in sequence to one column group:
//! each step is fit on the output of the previous one.

use crate::encoders::{FittedOneHotEncoder, OneHotEncoder};
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::imputers::{FittedSimpleImputer, SimpleImputer};
use crate::scalers::{FittedStandardScaler, StandardScaler};
use crate::traits::{FittedTransformer, Transformer};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Enum of unfitted stages usable in a [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Imputer(SimpleImputer),
    OneHotEncoder(OneHotEncoder),
    Scaler(StandardScaler),
}

/// Enum of fitted stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedStep {
    Imputer(FittedSimpleImputer),
    OneHotEncoder(FittedOneHotEncoder),
    Scaler(FittedStandardScaler),
}

impl Step {
    /// Stage type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Imputer(t) => t.name(),
            Step::OneHotEncoder(t) => t.name(),
            Step::Scaler(t) => t.name(),
        }
    }

    fn fit_transform(&self, df: &DataFrame) -> Result<(FittedStep, DataFrame)> {
        match self {
            Step::Imputer(t) => t
                .fit_transform(df)
                .map(|(f, out)| (FittedStep::Imputer(f), out)),
            Step::OneHotEncoder(t) => t
                .fit_transform(df)
                .map(|(f, out)| (FittedStep::OneHotEncoder(f), out)),
            Step::Scaler(t) => t
                .fit_transform(df)
                .map(|(f, out)| (FittedStep::Scaler(f), out)),
        }
    }
}

impl From<SimpleImputer> for Step {
    fn from(t: SimpleImputer) -> Self {
        Step::Imputer(t)
    }
}

impl From<OneHotEncoder> for Step {
    fn from(t: OneHotEncoder) -> Self {
        Step::OneHotEncoder(t)
    }
}

impl From<StandardScaler> for Step {
    fn from(t: StandardScaler) -> Self {
        Step::Scaler(t)
    }
}

impl FittedStep {
    fn as_transformer(&self) -> &dyn FittedTransformer {
        match self {
            FittedStep::Imputer(t) => t,
            FittedStep::OneHotEncoder(t) => t,
            FittedStep::Scaler(t) => t,
        }
    }
}

impl FittedTransformer for FittedStep {
    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.as_transformer().transform(df)
    }

    fn feature_names_in(&self) -> Vec<String> {
        self.as_transformer().feature_names_in()
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.as_transformer().feature_names_out()
    }
}

/// Unfitted sequence of named steps.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = Pipeline::new()
///     .step("imputer", SimpleImputer::median())
///     .step("scaler", StandardScaler::new());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pipeline {
    steps: Vec<(String, Step)>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named step.
    pub fn step(mut self, name: impl Into<String>, step: impl Into<Step>) -> Self {
        self.steps.push((name.into(), step.into()));
        self
    }

    pub fn steps(&self) -> &[(String, Step)] {
        &self.steps
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Check the pipeline has at least one step and unique, non-empty names.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(PreprocessingError::InvalidConfig(
                "pipeline has no steps".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (name, _) in &self.steps {
            if name.trim().is_empty() {
                return Err(PreprocessingError::InvalidConfig(
                    "pipeline step name must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(PreprocessingError::InvalidConfig(format!(
                    "duplicate pipeline step name '{}'",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Fit every step in order, returning the fitted pipeline and the
    /// transformed training data.
    pub fn fit_transform(&self, df: &DataFrame) -> Result<(FittedPipeline, DataFrame)> {
        self.validate()?;

        let mut fitted = Vec::with_capacity(self.steps.len());
        let mut current = df.clone();

        for (name, step) in &self.steps {
            let (fitted_step, out) = step
                .fit_transform(&current)
                .context(format!("Failed to fit step '{}' ({})", name, step.kind()))?;
            debug!(
                "Fitted step '{}' ({}): {} -> {} columns",
                name,
                step.kind(),
                current.width(),
                out.width()
            );
            fitted.push((name.clone(), fitted_step));
            current = out;
        }

        Ok((FittedPipeline { steps: fitted }, current))
    }

    /// Fit every step in order.
    pub fn fit(&self, df: &DataFrame) -> Result<FittedPipeline> {
        self.fit_transform(df).map(|(fitted, _)| fitted)
    }
}

/// Fitted sequence of named steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    steps: Vec<(String, FittedStep)>,
}

impl FittedPipeline {
    pub fn steps(&self) -> &[(String, FittedStep)] {
        &self.steps
    }

    /// Fitted step by name.
    pub fn named_step(&self, name: &str) -> Option<&FittedStep> {
        self.steps.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

impl FittedTransformer for FittedPipeline {
    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut current = df.clone();
        for (name, step) in &self.steps {
            current = step
                .transform(&current)
                .context(format!("Failed to apply step '{}'", name))?;
        }
        Ok(current)
    }

    fn feature_names_in(&self) -> Vec<String> {
        self.steps
            .first()
            .map(|(_, s)| s.feature_names_in())
            .unwrap_or_default()
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.steps
            .last()
            .map(|(_, s)| s.feature_names_out())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn categorical_pipeline() -> Pipeline {
        Pipeline::new()
            .step("imputer", SimpleImputer::most_frequent())
            .step("onehotencoder", OneHotEncoder::new())
            .step("scaler", StandardScaler::new().with_mean(false))
    }

    #[test]
    fn test_numeric_pipeline_imputes_before_scaling() {
        let df = df!["score" => [Some(1.0), None, Some(3.0)]].unwrap();
        let pipeline = Pipeline::new()
            .step("imputer", SimpleImputer::median())
            .step("scaler", StandardScaler::new());

        let (fitted, out) = pipeline.fit_transform(&df).unwrap();

        // [1, 2, 3] after imputing the median 2, then standardized
        let values: Vec<f64> = out
            .column("score")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        let std = (2.0_f64 / 3.0).sqrt();
        assert_eq!(values, vec![-1.0 / std, 0.0, 1.0 / std]);
        assert_eq!(fitted.feature_names_out(), vec!["score"]);
    }

    #[test]
    fn test_categorical_pipeline_output_columns() {
        let df = df!["lunch" => [Some("standard"), None, Some("free/reduced"), Some("standard")]]
            .unwrap();

        let (fitted, out) = categorical_pipeline().fit_transform(&df).unwrap();

        assert_eq!(out.width(), 2);
        assert_eq!(
            fitted.feature_names_out(),
            vec!["lunch_free/reduced", "lunch_standard"]
        );
        assert_eq!(fitted.feature_names_in(), vec!["lunch"]);
        assert!(matches!(
            fitted.named_step("onehotencoder"),
            Some(FittedStep::OneHotEncoder(_))
        ));
    }

    #[test]
    fn test_categorical_pipeline_imputes_float_nan() {
        let df = df!["c" => [Some(1.0), Some(f64::NAN), Some(1.0), None, Some(2.0)]].unwrap();

        let (fitted, out) = categorical_pipeline().fit_transform(&df).unwrap();

        let names = fitted.feature_names_out();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.contains("NaN")));
        assert_eq!(out.height(), 5);
    }

    #[test]
    fn test_transform_matches_fit_transform() {
        let df = df!["g" => ["a", "b", "b", "c"]].unwrap();
        let (fitted, train_out) = categorical_pipeline().fit_transform(&df).unwrap();
        let again = fitted.transform(&df).unwrap();
        assert!(train_out.equals(&again));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let pipeline = Pipeline::new()
            .step("scaler", StandardScaler::new())
            .step("scaler", StandardScaler::new());
        let err = pipeline.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_step_failure_names_the_step() {
        let df = df!["x" => [Some(1.0), None]].unwrap();
        let pipeline = Pipeline::new().step("scaler", StandardScaler::new());

        let err = pipeline.fit(&df).unwrap_err();
        assert!(err.to_string().contains("Failed to fit step 'scaler'"));
        assert_eq!(err.error_code(), "MISSING_VALUES");
    }
}
