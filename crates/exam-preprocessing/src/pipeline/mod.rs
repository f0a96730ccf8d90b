//! Pipeline module.
//!
//! Named stage chains, the column transformer that dispatches them over
//! column groups, and the builder for the exam preprocessor.

mod builder;
mod column_transformer;
mod steps;

pub use builder::{CATEGORICAL_GROUP, NUMERIC_GROUP, PreprocessorBuilder};
pub use column_transformer::{ColumnGroup, ColumnTransformer};
pub use steps::{FittedPipeline, FittedStep, Pipeline, Step};
