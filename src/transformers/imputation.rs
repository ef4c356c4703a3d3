//! ## Transformers for imputing missing values
//!
//! - **Imputer**: Replaces missing values in every column: numeric columns with their median,
//!   text, categorical and boolean columns with their most frequent value.
//! - **FillMissing**: Replaces missing values in one column with a given value.
//!
//! The statistics used by [`Imputer`] for feature columns are computed over train and test combined.
//! This matches how the operation has always behaved, but it lets test rows influence the values
//! written into train, which is a known leakage risk. The target column only exists in train and is
//! imputed from train alone.

use crate::dataset::{ColumnKind, Dataset};
use crate::exceptions::WorkbenchResult;
use crate::transformers::helpers::{
    cast_scalar, coalesce_expr_for, count_missing, median_of, mode, null_counts, project_with,
    value_counts,
};
use crate::{impl_operation, impl_summary};
use datafusion::logical_expr::lit;
use datafusion::scalar::ScalarValue;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// Outcome of [`Imputer`]: missing values in train before and after imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImputeSummary {
    pub before: i64,
    pub after: i64,
}

impl fmt::Display for ImputeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imputed {} empty values to {}.", self.before, self.after)
    }
}

/// Replaces missing values across the whole dataset.
#[derive(Debug, Default)]
pub struct Imputer;

impl Imputer {
    pub fn new() -> Self {
        Self
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<ImputeSummary> {
        let (train_nulls, test_nulls) =
            futures::try_join!(null_counts(dataset.train()), null_counts(dataset.test()))?;
        let test_nulls: HashMap<String, i64> = test_nulls.into_iter().collect();
        let before: i64 = train_nulls.iter().map(|(_, n)| n).sum();

        let mut train = dataset.train().clone();
        let mut test = dataset.test().clone();
        for (name, train_missing) in &train_nulls {
            let in_test = test_nulls.contains_key(name);
            let test_missing = test_nulls.get(name).copied().unwrap_or(0);
            if *train_missing == 0 && test_missing == 0 {
                continue;
            }
            let data_type = dataset.data_type(name)?;
            let fill = match ColumnKind::of(&data_type) {
                ColumnKind::Numeric => {
                    let frames = if in_test {
                        vec![dataset.train(), dataset.test()]
                    } else {
                        vec![dataset.train()]
                    };
                    median_of(&frames, name).await?.map(ScalarValue::from)
                }
                ColumnKind::Text | ColumnKind::Categorical | ColumnKind::Boolean => {
                    let mut counts: HashMap<ScalarValue, i64> = HashMap::new();
                    for (value, n) in value_counts(dataset.train(), name).await? {
                        let value = cast_scalar(&value, &data_type, name)?;
                        *counts.entry(value).or_insert(0) += n;
                    }
                    if in_test {
                        for (value, n) in value_counts(dataset.test(), name).await? {
                            let value = cast_scalar(&value, &data_type, name)?;
                            *counts.entry(value).or_insert(0) += n;
                        }
                    }
                    mode(&counts.into_iter().collect::<Vec<_>>())
                }
                ColumnKind::List | ColumnKind::Other => None,
            };
            let Some(fill) = fill else {
                debug!(column = %name, "no imputation value available");
                continue;
            };
            debug!(column = %name, value = %fill, "imputing missing values");
            train = project_with(train, name, coalesce_expr_for(name, lit(fill.clone())))?;
            if in_test {
                test = project_with(test, name, coalesce_expr_for(name, lit(fill)))?;
            }
        }
        dataset.commit(train, test)?;

        let summary = ImputeSummary {
            before,
            after: count_missing(dataset.train()).await?,
        };
        info!("{}", summary);
        Ok(summary)
    }
}

/// Replaces missing values in one column with a fixed value, leaving other values untouched.
pub struct FillMissing {
    pub column: String,
    pub value: ScalarValue,
}

impl FillMissing {
    pub fn new(column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        dataset.require_columns(&[self.column.as_str()])?;
        let fallback = || coalesce_expr_for(&self.column, lit(self.value.clone()));
        let train = project_with(dataset.train().clone(), &self.column, fallback())?;
        let test = project_with(dataset.test().clone(), &self.column, fallback())?;
        dataset.commit(train, test)
    }
}

impl_summary!(ImputeSummary);
impl_operation!(Imputer);
impl_operation!(FillMissing);
