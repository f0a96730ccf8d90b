//! Imputation module for handling missing values.
//!
//! Provides the statistical imputer used as the first stage of every
//! column group pipeline (median for numeric, most frequent for categorical).

mod simple;

pub use simple::{FillValue, FittedSimpleImputer, ImputeStrategy, SimpleImputer};
