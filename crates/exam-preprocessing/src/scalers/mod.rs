//! Feature scaling.

mod standard;

pub use standard::{FittedStandardScaler, StandardScaler};
