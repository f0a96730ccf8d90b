//! StandardScaler: z-score normalization.
//!
//! Transforms features to zero mean and unit variance:
//! `z = (x - mean) / std`, or `z = x / std` with centering disabled.
//! The standard deviation is the population one (ddof = 0).

use crate::error::{PreprocessingError, Result};
use crate::traits::{FittedTransformer, Transformer};
use crate::utils::{column, float_column, mean_and_std, missing_count, numeric_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unfitted standard scaler.
///
/// Centering should be disabled for one-hot indicator columns: subtracting
/// the mean turns sparse 0/1 indicators into dense values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardScaler {
    with_mean: bool,
    with_std: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to subtract the mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Whether to divide by the standard deviation.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.with_std = with_std;
        self
    }

    pub fn centers(&self) -> bool {
        self.with_mean
    }

    fn complete_values(&self, series: &Series) -> Result<Vec<f64>> {
        let values = numeric_values(series)?;
        let missing = missing_count(&values);
        if missing > 0 {
            return Err(PreprocessingError::MissingValues {
                column: series.name().to_string(),
                stage: self.name().to_string(),
                count: missing,
            });
        }
        Ok(values.into_iter().flatten().collect())
    }
}

/// Replace near-zero scales with 1.0 so constant columns pass through.
fn handle_zero_scale(std: f64, mean: f64) -> f64 {
    if std <= 10.0 * f64::EPSILON * mean.abs().max(1.0) {
        1.0
    } else {
        std
    }
}

impl Transformer for StandardScaler {
    type Fitted = FittedStandardScaler;

    fn name(&self) -> &'static str {
        "StandardScaler"
    }

    fn fit(&self, df: &DataFrame) -> Result<FittedStandardScaler> {
        let mut columns = Vec::with_capacity(df.width());
        let mut mean = Vec::with_capacity(df.width());
        let mut scale = Vec::with_capacity(df.width());

        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let values = self.complete_values(series)?;
            let name = series.name().to_string();

            let (m, s) = mean_and_std(&values)
                .ok_or_else(|| PreprocessingError::NoValidValues(name.clone()))?;

            debug!("Scaler stats for '{}': mean={:.4}, std={:.4}", name, m, s);
            columns.push(name);
            mean.push(m);
            scale.push(if self.with_std { handle_zero_scale(s, m) } else { 1.0 });
        }

        Ok(FittedStandardScaler {
            with_mean: self.with_mean,
            columns,
            mean,
            scale,
        })
    }
}

/// Scaler with per-column mean and scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedStandardScaler {
    with_mean: bool,
    columns: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl FittedStandardScaler {
    /// Per-column means seen during fit.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-column divisors (standard deviation, or 1.0 for constant columns).
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

impl FittedTransformer for FittedStandardScaler {
    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = Vec::with_capacity(self.columns.len());

        for (i, name) in self.columns.iter().enumerate() {
            let series = column(df, name)?;
            let values = numeric_values(series)?;

            let missing = missing_count(&values);
            if missing > 0 {
                return Err(PreprocessingError::MissingValues {
                    column: name.clone(),
                    stage: "StandardScaler".to_string(),
                    count: missing,
                });
            }

            let shift = if self.with_mean { self.mean[i] } else { 0.0 };
            let scale = self.scale[i];
            let scaled = values
                .into_iter()
                .flatten()
                .map(|x| (x - shift) / scale)
                .collect();
            out.push(float_column(name, scaled));
        }

        Ok(DataFrame::new(out)?)
    }

    fn feature_names_in(&self) -> Vec<String> {
        self.columns.clone()
    }
}
