//! Core traits for preprocessing stages.
//!
//! - [`Transformer`]: an unfitted stage holding only hyperparameters.
//! - [`FittedTransformer`]: the stage after fit, holding learned parameters.
//!
//! Both sides work on polars `DataFrame`s whose columns are exactly the
//! columns the stage operates on; selecting those columns is the job of the
//! column transformer.

use crate::error::Result;
use polars::prelude::DataFrame;

/// An unfitted preprocessing stage.
pub trait Transformer {
    /// The fitted counterpart produced by [`Transformer::fit`].
    type Fitted: FittedTransformer;

    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Learn parameters from every column of `df`.
    fn fit(&self, df: &DataFrame) -> Result<Self::Fitted>;

    /// Fit, then transform the same data.
    fn fit_transform(&self, df: &DataFrame) -> Result<(Self::Fitted, DataFrame)> {
        let fitted = self.fit(df)?;
        let out = fitted.transform(df)?;
        Ok((fitted, out))
    }
}

/// A fitted preprocessing stage ready for inference.
pub trait FittedTransformer {
    /// Apply the learned parameters to `df`.
    ///
    /// `df` must contain the columns seen during fit; other columns are
    /// ignored.
    fn transform(&self, df: &DataFrame) -> Result<DataFrame>;

    /// Columns seen during fit, in order.
    fn feature_names_in(&self) -> Vec<String>;

    /// Columns produced by [`FittedTransformer::transform`], in order.
    fn feature_names_out(&self) -> Vec<String> {
        self.feature_names_in()
    }
}
