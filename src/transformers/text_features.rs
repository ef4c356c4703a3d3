//! ## Transformers for list and free-form text features
//!
//! - **ListLength:** Number of items in each value of a list feature.
//! - **WordCount:** Number of whitespace-separated words in each value of a text feature.
//! - **RegexExtract:** First capture group of a regular expression matched against a text feature.
//!
//! These transformers compute new Arrow arrays directly from the collected record batches of each
//! table, then register the rewritten batches as the new table. Nulls stay null.

use crate::dataset::{put_column, ColumnKind, Dataset};
use crate::exceptions::{WorkbenchError, WorkbenchResult};
use crate::impl_operation;
use crate::transformers::helpers::as_strings;
use arrow::array::{
    Array, ArrayRef, FixedSizeListArray, Int64Array, LargeListArray, ListArray, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use regex::Regex;
use std::sync::Arc;

fn input_column<'a>(batch: &'a RecordBatch, name: &str) -> WorkbenchResult<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| WorkbenchError::MissingColumn(format!("Column '{}' not found", name)))
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> WorkbenchResult<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        WorkbenchError::TypeMismatch(format!(
            "Unexpected array type {} for column {}",
            array.data_type(),
            name
        ))
    })
}

/// Item count of each list in `array`.
fn list_lengths(array: &ArrayRef, name: &str) -> WorkbenchResult<Int64Array> {
    let lengths: Int64Array = match array.data_type() {
        DataType::List(_) => {
            let list = downcast::<ListArray>(array, name)?;
            (0..list.len())
                .map(|i| (!list.is_null(i)).then(|| i64::from(list.value_length(i))))
                .collect()
        }
        DataType::LargeList(_) => {
            let list = downcast::<LargeListArray>(array, name)?;
            (0..list.len())
                .map(|i| (!list.is_null(i)).then(|| list.value_length(i)))
                .collect()
        }
        DataType::FixedSizeList(_, size) => {
            let list = downcast::<FixedSizeListArray>(array, name)?;
            (0..list.len())
                .map(|i| (!list.is_null(i)).then_some(i64::from(*size)))
                .collect()
        }
        other => {
            return Err(WorkbenchError::TypeMismatch(format!(
                "Column '{}' holds {} values rather than lists",
                name, other
            )))
        }
    };
    Ok(lengths)
}

/// Creates `new` holding the item count of list feature `column`.
pub struct ListLength {
    pub new: String,
    pub column: String,
}

impl ListLength {
    pub fn new(new: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            new: new.into(),
            column: column.into(),
        }
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        dataset.require_columns(&[self.column.as_str()])?;
        let kind = dataset.column_kind(&self.column)?;
        if kind != ColumnKind::List {
            return Err(WorkbenchError::TypeMismatch(format!(
                "Column '{}' holds {:?} values rather than lists",
                self.column, kind
            )));
        }
        dataset.check_new_column(&self.new)?;
        let rewrite = |batch: &RecordBatch| {
            let lengths = list_lengths(input_column(batch, &self.column)?, &self.column)?;
            put_column(batch, &self.new, Arc::new(lengths))
        };
        let train = dataset.map_batches(dataset.train().clone(), rewrite).await?;
        let test = dataset.map_batches(dataset.test().clone(), rewrite).await?;
        dataset.commit(train, test)
    }
}

/// Creates `new` holding the number of whitespace-separated words of text feature `column`.
pub struct WordCount {
    pub new: String,
    pub column: String,
}

impl WordCount {
    pub fn new(new: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            new: new.into(),
            column: column.into(),
        }
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        dataset.require_columns(&[self.column.as_str()])?;
        dataset.require_text(&self.column)?;
        dataset.check_new_column(&self.new)?;
        let rewrite = |batch: &RecordBatch| {
            let text = as_strings(input_column(batch, &self.column)?)?;
            let counts: Int64Array = text
                .iter()
                .map(|value| value.map(|s| s.split_whitespace().count() as i64))
                .collect();
            put_column(batch, &self.new, Arc::new(counts))
        };
        let train = dataset.map_batches(dataset.train().clone(), rewrite).await?;
        let test = dataset.map_batches(dataset.test().clone(), rewrite).await?;
        dataset.commit(train, test)
    }
}

/// Matches `pattern` against text feature `column` and keeps the first capture group, or an empty
/// string when the pattern does not match. The result replaces `column` unless `new` is given.
pub struct RegexExtract {
    pub column: String,
    pub pattern: String,
    pub new: Option<String>,
}

impl RegexExtract {
    pub fn new(column: impl Into<String>, pattern: impl Into<String>, new: Option<&str>) -> Self {
        Self {
            column: column.into(),
            pattern: pattern.into(),
            new: new.map(str::to_string),
        }
    }

    /// Column written by this transformer.
    pub fn output_column(&self) -> &str {
        self.new.as_deref().unwrap_or(&self.column)
    }

    fn compile(&self) -> WorkbenchResult<Regex> {
        let regex = Regex::new(&self.pattern).map_err(|e| {
            WorkbenchError::InvalidParameter(format!("Invalid regex '{}': {}", self.pattern, e))
        })?;
        if regex.captures_len() < 2 {
            return Err(WorkbenchError::InvalidParameter(format!(
                "Regex '{}' has no capture group",
                self.pattern
            )));
        }
        Ok(regex)
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        let regex = self.compile()?;
        dataset.require_columns(&[self.column.as_str()])?;
        dataset.require_text(&self.column)?;
        let output = self.output_column();
        if output != self.column {
            dataset.check_new_column(output)?;
        }
        let rewrite = |batch: &RecordBatch| {
            let text = as_strings(input_column(batch, &self.column)?)?;
            let extracted: StringArray = text
                .iter()
                .map(|value| {
                    value.map(|s| {
                        regex
                            .captures(s)
                            .and_then(|caps| caps.get(1))
                            .map_or("", |m| m.as_str())
                    })
                })
                .collect();
            put_column(batch, output, Arc::new(extracted))
        };
        let train = dataset.map_batches(dataset.train().clone(), rewrite).await?;
        let test = dataset.map_batches(dataset.test().clone(), rewrite).await?;
        dataset.commit(train, test)
    }
}

impl_operation!(ListLength);
impl_operation!(WordCount);
impl_operation!(RegexExtract);
