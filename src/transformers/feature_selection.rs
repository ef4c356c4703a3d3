//! ## Feature Selection Transformers
//!
//! - [`DropFeatures`]: Removes named features from both the train and the test table.

use crate::dataset::Dataset;
use crate::exceptions::{WorkbenchError, WorkbenchResult};
use crate::{impl_operation, impl_summary};
use datafusion::dataframe::DataFrame;
use datafusion::logical_expr::Expr;
use datafusion_expr::ident;
use std::fmt;
use tracing::info;

/// Outcome of [`DropFeatures`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropSummary {
    /// Number of columns removed from train.
    pub dropped: usize,
    /// Number of columns left in train (target included).
    pub remaining: usize,
}

impl fmt::Display for DropSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dropped {} features with {} features available.",
            self.dropped, self.remaining
        )
    }
}

/// Removes the specified columns from train and test.
pub struct DropFeatures {
    pub features: Vec<String>,
}

impl DropFeatures {
    pub fn new<S: Into<String>>(features: impl IntoIterator<Item = S>) -> Self {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    fn retain(&self, df: DataFrame) -> WorkbenchResult<DataFrame> {
        let kept: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .filter(|field| !self.features.contains(field.name()))
            .map(|field| ident(field.name().as_str()))
            .collect();
        if kept.is_empty() {
            return Err(WorkbenchError::InvalidParameter(
                "Dropping these features would result in an empty table.".to_string(),
            ));
        }
        df.select(kept).map_err(WorkbenchError::from)
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<DropSummary> {
        let names: Vec<&str> = self.features.iter().map(String::as_str).collect();
        dataset.require_columns(&names)?;
        let start = dataset.train().schema().fields().len();

        let train = self.retain(dataset.train().clone())?;
        let test = self.retain(dataset.test().clone())?;
        dataset.commit(train, test)?;

        let remaining = dataset.train().schema().fields().len();
        let summary = DropSummary {
            dropped: start - remaining,
            remaining,
        };
        info!(features = ?self.features, "{}", summary);
        Ok(summary)
    }
}

impl_summary!(DropSummary);
impl_operation!(DropFeatures);
