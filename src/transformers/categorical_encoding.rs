//! # Categorical Encoding Transformers
//!
//! This module provides the transformers that turn categorical values into numbers or rewrite them.
//!
//! The encoders include:
//! - **OrdinalMapper:** Replaces each value with a number from a user-supplied mapping.
//! - **ReplaceValues:** Replaces one or more specific values with a new value.
//! - **DensityEncoder:** Adds a column holding how often each value occurs in train.
//! - **LabelEncoder:** Replaces each distinct value with a dense integer code shared by train and test.
//!
//! Mappings are learned with aggregate queries and applied as `CASE WHEN` expressions, so the same
//! value always maps to the same output in both tables.

use crate::dataset::{ColumnKind, Dataset};
use crate::exceptions::{WorkbenchError, WorkbenchResult};
use crate::settings::DENSITY_SUFFIX;
use crate::transformers::helpers::{
    build_case_expr, cast_scalar, distinct_values, project_with, value_counts,
};
use crate::impl_operation;
use datafusion::logical_expr::{lit, Case as DFCase, Expr};
use datafusion::scalar::ScalarValue;
use datafusion_expr::ident;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// ------------------------- OrdinalMapper -------------------------
///
/// Converts an ordinal feature using an explicit value-to-number mapping.
/// Every non-null value found in train or test must have an entry; nulls stay null.
pub struct OrdinalMapper {
    pub column: String,
    pub mapping: Vec<(ScalarValue, ScalarValue)>,
}

impl OrdinalMapper {
    pub fn new<K, V>(column: impl Into<String>, mapping: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<ScalarValue>,
        V: Into<ScalarValue>,
    {
        Self {
            column: column.into(),
            mapping: mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        dataset.require_columns(&[self.column.as_str()])?;
        let data_type = dataset.data_type(&self.column)?;
        let mapping = self
            .mapping
            .iter()
            .map(|(k, v)| Ok((cast_scalar(k, &data_type, &self.column)?, v.clone())))
            .collect::<WorkbenchResult<Vec<_>>>()?;

        let (train_values, test_values) = futures::try_join!(
            distinct_values(dataset.train(), &self.column),
            distinct_values(dataset.test(), &self.column)
        )?;
        let keys: HashSet<&ScalarValue> = mapping.iter().map(|(k, _)| k).collect();
        for value in train_values.iter().chain(test_values.iter()) {
            let value = cast_scalar(value, &data_type, &self.column)?;
            if !keys.contains(&value) {
                return Err(WorkbenchError::KeyLookup(format!(
                    "No mapping for value {} in column '{}'",
                    value, self.column
                )));
            }
        }

        let expr = || build_case_expr(&self.column, &mapping, None);
        let train = project_with(dataset.train().clone(), &self.column, expr())?;
        let test = project_with(dataset.test().clone(), &self.column, expr())?;
        dataset.commit(train, test)
    }
}

/// ------------------------- ReplaceValues -------------------------
///
/// Replaces every occurrence of any of `matches` with `value`.
pub struct ReplaceValues {
    pub column: String,
    pub matches: Vec<ScalarValue>,
    pub value: ScalarValue,
}

impl ReplaceValues {
    pub fn new<M: Into<ScalarValue>>(
        column: impl Into<String>,
        matches: impl IntoIterator<Item = M>,
        value: impl Into<ScalarValue>,
    ) -> Self {
        Self {
            column: column.into(),
            matches: matches.into_iter().map(Into::into).collect(),
            value: value.into(),
        }
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        dataset.require_columns(&[self.column.as_str()])?;
        if self.matches.is_empty() {
            return Ok(());
        }
        let data_type = dataset.data_type(&self.column)?;
        let list = self
            .matches
            .iter()
            .map(|m| cast_scalar(m, &data_type, &self.column).map(lit))
            .collect::<WorkbenchResult<Vec<Expr>>>()?;
        let expr = || {
            Expr::Case(DFCase {
                expr: None,
                when_then_expr: vec![(
                    Box::new(ident(self.column.as_str()).in_list(list.clone(), false)),
                    Box::new(lit(self.value.clone())),
                )],
                else_expr: Some(Box::new(ident(self.column.as_str()))),
            })
        };
        let train = project_with(dataset.train().clone(), &self.column, expr())?;
        let test = project_with(dataset.test().clone(), &self.column, expr())?;
        dataset.commit(train, test)
    }
}

/// ------------------------- DensityEncoder -------------------------
///
/// Adds `<column>_density`: the number of times the row's value occurs in train's column.
/// Counts come from train only; values never seen in train (and nulls) get the smallest train count.
pub struct DensityEncoder {
    pub column: String,
}

impl DensityEncoder {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// Name of the column this encoder creates.
    pub fn output_column(&self) -> String {
        format!("{}{}", self.column, DENSITY_SUFFIX)
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        dataset.require_columns(&[self.column.as_str()])?;
        if dataset.column_kind(&self.column)? == ColumnKind::List {
            return Err(WorkbenchError::TypeMismatch(format!(
                "Cannot count list values of column '{}'",
                self.column
            )));
        }
        let output = self.output_column();
        dataset.check_new_column(&output)?;

        let counts = value_counts(dataset.train(), &self.column).await?;
        let min_count = counts.iter().map(|(_, n)| *n).min();
        debug!(column = %self.column, distinct = counts.len(), ?min_count, "density counts");
        let mapping: Vec<(ScalarValue, ScalarValue)> = counts
            .into_iter()
            .map(|(value, n)| (value, ScalarValue::Int64(Some(n))))
            .collect();
        let default = lit(ScalarValue::Int64(min_count));

        let expr = || build_case_expr(&self.column, &mapping, Some(default.clone()));
        let train = project_with(dataset.train().clone(), &output, expr())?;
        let test = project_with(dataset.test().clone(), &output, expr())?;
        dataset.commit(train, test)
    }
}

/// ------------------------- LabelEncoder -------------------------
///
/// Replaces the values of each feature with integer codes `0..n`, assigned in sorted order of the
/// distinct non-null values found in train and test combined. Nulls stay null.
///
/// Learning the codes from both tables keeps them consistent, at the cost of letting test values
/// shape the encoding (a known leakage risk).
pub struct LabelEncoder {
    pub features: Vec<String>,
}

impl LabelEncoder {
    pub fn new<S: Into<String>>(features: impl IntoIterator<Item = S>) -> Self {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    /// Learns the sorted code table of one feature.
    async fn codes_for(
        dataset: &Dataset,
        feature: &str,
    ) -> WorkbenchResult<Vec<(ScalarValue, ScalarValue)>> {
        let data_type = dataset.data_type(feature)?;
        if matches!(ColumnKind::of(&data_type), ColumnKind::List | ColumnKind::Other) {
            return Err(WorkbenchError::TypeMismatch(format!(
                "Column '{}' of type {} cannot be label encoded",
                feature, data_type
            )));
        }
        let (train_values, test_values) = futures::try_join!(
            distinct_values(dataset.train(), feature),
            distinct_values(dataset.test(), feature)
        )?;
        let mut distinct: HashSet<ScalarValue> = HashSet::with_capacity(train_values.len());
        for value in train_values.into_iter().chain(test_values) {
            distinct.insert(cast_scalar(&value, &data_type, feature)?);
        }
        let mut values: Vec<ScalarValue> = distinct.into_iter().collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value, ScalarValue::Int64(Some(code as i64))))
            .collect())
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        let mut names: Vec<&str> = Vec::with_capacity(self.features.len());
        for feature in &self.features {
            // Codes are learned from the committed tables, so each feature is encoded once.
            if !names.contains(&feature.as_str()) {
                names.push(feature.as_str());
            }
        }
        dataset.require_columns(&names)?;
        let mut train = dataset.train().clone();
        let mut test = dataset.test().clone();
        for feature in names {
            let codes = Self::codes_for(dataset, feature).await?;
            debug!(column = %feature, classes = codes.len(), "label codes learned");
            train = project_with(train, feature, build_case_expr(feature, &codes, None))?;
            test = project_with(test, feature, build_case_expr(feature, &codes, None))?;
        }
        dataset.commit(train, test)
    }
}

impl_operation!(OrdinalMapper);
impl_operation!(ReplaceValues);
impl_operation!(DensityEncoder);
impl_operation!(LabelEncoder);
