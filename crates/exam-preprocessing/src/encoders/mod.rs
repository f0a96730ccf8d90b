//! Categorical encoders.

mod one_hot;

pub use one_hot::{FittedOneHotEncoder, HandleUnknown, OneHotEncoder};
