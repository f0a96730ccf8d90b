//! Shared utilities for the preprocessing stages.
//!
//! This module contains common helper functions used across the imputer,
//! encoder and scaler to read typed values out of polars columns and compute
//! the statistics they learn at fit time.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Look up a column by name, mapping absence to [`PreprocessingError::ColumnNotFound`].
pub fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| PreprocessingError::ColumnNotFound(name.to_string()))
}

/// Ensure every name in `names` is a column of `df`.
pub fn require_columns(df: &DataFrame, names: &[String]) -> Result<()> {
    for name in names {
        column(df, name)?;
    }
    Ok(())
}

// =============================================================================
// Value Extraction
// =============================================================================

/// Read a column as `f64` values, treating nulls and NaN as missing.
///
/// Strings and other non-numeric types are rejected rather than silently
/// coerced to null.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let dtype = series.dtype();
    if !is_numeric_dtype(dtype) && !matches!(dtype, DataType::Boolean | DataType::Null) {
        return Err(PreprocessingError::TypeConversionFailed {
            column: series.name().to_string(),
            target_type: "Float64".to_string(),
            reason: format!("column has non-numeric type {}", dtype),
        });
    }

    let casted = series.cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Read a column as string values, treating nulls (and NaN in float
/// columns) as missing.
pub fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    let nan_mask: Option<Vec<bool>> = match series.dtype() {
        DataType::Float32 | DataType::Float64 => Some(
            series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.is_some_and(f64::is_nan))
                .collect(),
        ),
        _ => None,
    };

    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| match &nan_mask {
            Some(mask) if mask[i] => None,
            _ => v.map(str::to_string),
        })
        .collect())
}

/// Count missing entries in an extracted column.
pub fn missing_count<T>(values: &[Option<T>]) -> usize {
    values.iter().filter(|v| v.is_none()).count()
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Median of the non-missing values; the mean of the two middle values for
/// an even count.
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(f64::total_cmp);

    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Most frequent non-missing value; ties go to the smallest value so the
/// result does not depend on row order.
pub fn string_mode(values: &[Option<String>]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for val in values.iter().flatten() {
        *counts.entry(val.as_str()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (val, count) in counts {
        // BTreeMap iterates in ascending order, so only a strictly larger
        // count replaces the current best.
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((val, count));
        }
    }
    best.map(|(val, _)| val.to_string())
}

/// Mean and population standard deviation (ddof = 0) of complete values.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

// =============================================================================
// Series Construction
// =============================================================================

/// Build a Float64 column.
pub fn float_column(name: &str, values: Vec<f64>) -> Column {
    Column::new(name.into(), values)
}

/// Build a nullable Float64 column.
pub fn optional_float_column(name: &str, values: Vec<Option<f64>>) -> Column {
    Column::new(name.into(), values)
}

/// Build a nullable String column.
pub fn optional_string_column(name: &str, values: Vec<Option<String>>) -> Column {
    Column::new(name.into(), values)
}

// =============================================================================
// Tests
// =============================================================================
