//! ## Paired train/test dataset
//!
//! A [`Dataset`] owns the two DataFusion tables every operation works on: `train`, which carries the
//! target column, and `test`, which carries every other column of `train` and nothing else.
//!
//! All mutations go through [`Dataset::commit`], which checks that the candidate tables still share
//! their columns (target excluded) with compatible types before swapping them in, and then refreshes
//! the numeric-only view used by downstream reporting. A rejected commit leaves the dataset untouched.

use crate::exceptions::{WorkbenchError, WorkbenchResult};
use crate::settings::DatasetOptions;
use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;
use datafusion_expr::{ident, Expr};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, warn};

/// The kind of values a column holds, derived from its Arrow type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    /// Dictionary-encoded values.
    Categorical,
    List,
    Boolean,
    Other,
}

impl ColumnKind {
    /// Classifies an Arrow data type.
    pub fn of(data_type: &DataType) -> Self {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Self::Text,
            DataType::Dictionary(_, _) => Self::Categorical,
            DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(_, _) => {
                Self::List
            }
            DataType::Boolean => Self::Boolean,
            dt if dt.is_numeric() => Self::Numeric,
            _ => Self::Other,
        }
    }

    /// True for plain text and dictionary-encoded columns.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::Categorical)
    }

    fn compatible_with(self, other: ColumnKind) -> bool {
        self == other || (self.is_textual() && other.is_textual())
    }
}

/// Train and test tables sharing a schema, plus the name of the target column found only in train.
pub struct Dataset {
    ctx: SessionContext,
    train: DataFrame,
    test: DataFrame,
    target: String,
    options: DatasetOptions,
    numeric_columns: Vec<String>,
}

impl Dataset {
    /// Wraps tables produced by a loader. Fails if `target` is absent from `train`, present in
    /// `test`, or if the remaining columns of the two tables differ.
    pub fn new(
        train: DataFrame,
        test: DataFrame,
        target: impl Into<String>,
    ) -> WorkbenchResult<Self> {
        let target = target.into();
        synchronize_schema(&train, &test, &target)?;
        let numeric_columns = numeric_columns_of(&train);
        // Materialized tables are re-read through this context; a single target partition keeps
        // rows in insertion order.
        let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
        Ok(Self {
            ctx,
            train,
            test,
            target,
            options: DatasetOptions::default(),
            numeric_columns,
        })
    }

    /// Builds a dataset from one in-memory record batch per table.
    pub fn from_batches(
        train: RecordBatch,
        test: RecordBatch,
        target: impl Into<String>,
    ) -> WorkbenchResult<Self> {
        let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
        let train = table_from_batches(&ctx, vec![train])?;
        let test = table_from_batches(&ctx, vec![test])?;
        let mut dataset = Self::new(train, test, target)?;
        dataset.ctx = ctx;
        Ok(dataset)
    }

    /// Replaces the dataset options.
    pub fn with_options(mut self, options: DatasetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn train(&self) -> &DataFrame {
        &self.train
    }

    pub fn test(&self) -> &DataFrame {
        &self.test
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn options(&self) -> DatasetOptions {
        self.options
    }

    /// Hands the tables back to the caller.
    pub fn into_parts(self) -> (DataFrame, DataFrame) {
        (self.train, self.test)
    }

    /// Column names of `train`, target included, in table order.
    pub fn column_names(&self) -> Vec<String> {
        field_names(&self.train)
    }

    /// Column names shared by both tables, in `test` order.
    pub fn feature_names(&self) -> Vec<String> {
        field_names(&self.test)
    }

    /// Names of the numeric columns of `train`, as of the last commit.
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    /// `train` restricted to its numeric columns.
    pub fn numeric_train(&self) -> WorkbenchResult<DataFrame> {
        self.project_numeric(&self.train)
    }

    /// `test` restricted to the numeric columns it shares with `train`.
    pub fn numeric_test(&self) -> WorkbenchResult<DataFrame> {
        self.project_numeric(&self.test)
    }

    fn project_numeric(&self, df: &DataFrame) -> WorkbenchResult<DataFrame> {
        let exprs: Vec<Expr> = self
            .numeric_columns
            .iter()
            .filter(|name| df.schema().has_column_with_unqualified_name(name))
            .map(|name| ident(name.as_str()))
            .collect();
        Ok(df.clone().select(exprs)?)
    }

    /// Checks that every named column exists in both tables.
    pub fn require_columns(&self, names: &[&str]) -> WorkbenchResult<()> {
        for name in names {
            for (label, df) in [("train", &self.train), ("test", &self.test)] {
                if !df.schema().has_column_with_unqualified_name(name) {
                    return Err(WorkbenchError::MissingColumn(format!(
                        "Column '{}' not found in {} table",
                        name, label
                    )));
                }
            }
        }
        Ok(())
    }

    /// Arrow type of a column as declared by `train`.
    pub fn data_type(&self, name: &str) -> WorkbenchResult<DataType> {
        self.train
            .schema()
            .field_with_unqualified_name(name)
            .map(|field| field.data_type().clone())
            .map_err(|_| {
                WorkbenchError::MissingColumn(format!("Column '{}' not found in train table", name))
            })
    }

    /// Value kind of a column as declared by `train`.
    pub fn column_kind(&self, name: &str) -> WorkbenchResult<ColumnKind> {
        self.data_type(name).map(|dt| ColumnKind::of(&dt))
    }

    /// Fails with `TypeMismatch` unless the column is numeric in both tables.
    pub fn require_numeric(&self, name: &str) -> WorkbenchResult<()> {
        for df in [&self.train, &self.test] {
            let field = df.schema().field_with_unqualified_name(name)?;
            if ColumnKind::of(field.data_type()) != ColumnKind::Numeric {
                return Err(WorkbenchError::TypeMismatch(format!(
                    "Column '{}' is {} rather than numeric",
                    name,
                    field.data_type()
                )));
            }
        }
        Ok(())
    }

    /// Fails with `TypeMismatch` unless the column is text or dictionary-encoded text.
    pub fn require_text(&self, name: &str) -> WorkbenchResult<()> {
        let kind = self.column_kind(name)?;
        if kind.is_textual() {
            Ok(())
        } else {
            Err(WorkbenchError::TypeMismatch(format!(
                "Column '{}' holds {:?} values rather than text",
                name, kind
            )))
        }
    }

    /// Validates the name of a column about to be created.
    ///
    /// Replacing an existing column is allowed unless the dataset options forbid it.
    pub fn check_new_column(&self, name: &str) -> WorkbenchResult<()> {
        if name.trim().is_empty() {
            return Err(WorkbenchError::InvalidParameter(
                "New column name cannot be empty".to_string(),
            ));
        }
        if name == self.target {
            return Err(WorkbenchError::InvalidParameter(format!(
                "Cannot create a column named after the target '{}'",
                name
            )));
        }
        if self.train.schema().has_column_with_unqualified_name(name) {
            if !self.options.allow_overwrite {
                return Err(WorkbenchError::DuplicateColumn(format!(
                    "Column '{}' already exists",
                    name
                )));
            }
            warn!(column = name, "overwriting existing column");
        }
        Ok(())
    }

    /// Swaps in new tables after checking that they are still in sync, then refreshes the
    /// numeric view.
    pub fn commit(&mut self, train: DataFrame, test: DataFrame) -> WorkbenchResult<()> {
        synchronize_schema(&train, &test, &self.target)?;
        self.numeric_columns = numeric_columns_of(&train);
        self.train = train;
        self.test = test;
        debug!(
            columns = self.train.schema().fields().len(),
            numeric = self.numeric_columns.len(),
            "dataset committed"
        );
        Ok(())
    }

    /// Collects `df`, rewrites each record batch with `f` (batches are processed in parallel),
    /// and registers the result as a new in-memory table.
    ///
    /// The plan is re-run under the dataset's own session and its partitions are concatenated
    /// in partition order, so rows keep their order even when a loader split the table into
    /// several partitions.
    pub async fn map_batches<F>(&self, df: DataFrame, f: F) -> WorkbenchResult<DataFrame>
    where
        F: Fn(&RecordBatch) -> WorkbenchResult<RecordBatch> + Send + Sync,
    {
        let schema = Arc::clone(df.schema().inner());
        let df = self
            .ctx
            .execute_logical_plan(df.into_unoptimized_plan())
            .await?;
        let mut batches: Vec<RecordBatch> = df
            .collect_partitioned()
            .await?
            .into_iter()
            .flatten()
            .collect();
        if batches.is_empty() {
            batches.push(RecordBatch::new_empty(schema));
        }
        let mapped = batches
            .par_iter()
            .map(&f)
            .collect::<WorkbenchResult<Vec<_>>>()?;
        table_from_batches(&self.ctx, mapped)
    }
}

/// Returns `batch` with `array` stored under `name`, replacing a column of that name in place or
/// appending a new one.
pub fn put_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> WorkbenchResult<RecordBatch> {
    let schema = batch.schema();
    let field: FieldRef = Arc::new(Field::new(name, array.data_type().clone(), true));
    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    let mut columns = batch.columns().to_vec();
    match schema.index_of(name) {
        Ok(i) => {
            fields[i] = field;
            columns[i] = array;
        }
        Err(_) => {
            fields.push(field);
            columns.push(array);
        }
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn table_from_batches(ctx: &SessionContext, batches: Vec<RecordBatch>) -> WorkbenchResult<DataFrame> {
    let schema = batches.first().map(|b| b.schema()).ok_or_else(|| {
        WorkbenchError::InvalidParameter("Cannot build a table without a record batch".into())
    })?;
    let table = MemTable::try_new(schema, vec![batches])?;
    Ok(ctx.read_table(Arc::new(table))?)
}

fn field_names(df: &DataFrame) -> Vec<String> {
    df.schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}

fn numeric_columns_of(df: &DataFrame) -> Vec<String> {
    df.schema()
        .fields()
        .iter()
        .filter(|f| ColumnKind::of(f.data_type()) == ColumnKind::Numeric)
        .map(|f| f.name().to_string())
        .collect()
}

/// Checks the pairing invariants: `target` only in `train`, identical remaining column sets, and
/// compatible value kinds for every shared column.
fn synchronize_schema(train: &DataFrame, test: &DataFrame, target: &str) -> WorkbenchResult<()> {
    let train_schema = train.schema();
    let test_schema = test.schema();
    if !train_schema.has_column_with_unqualified_name(target) {
        return Err(WorkbenchError::MissingColumn(format!(
            "Target column '{}' not found in train table",
            target
        )));
    }
    if test_schema.has_column_with_unqualified_name(target) {
        return Err(WorkbenchError::SchemaMismatch(format!(
            "Test table must not carry the target column '{}'",
            target
        )));
    }
    for field in test_schema.fields() {
        let train_field = train_schema
            .field_with_unqualified_name(field.name())
            .map_err(|_| {
                WorkbenchError::SchemaMismatch(format!(
                    "Column '{}' exists in test but not in train",
                    field.name()
                ))
            })?;
        let (train_kind, test_kind) = (
            ColumnKind::of(train_field.data_type()),
            ColumnKind::of(field.data_type()),
        );
        if !train_kind.compatible_with(test_kind) {
            return Err(WorkbenchError::SchemaMismatch(format!(
                "Column '{}' is {} in train but {} in test",
                field.name(),
                train_field.data_type(),
                field.data_type()
            )));
        }
    }
    for field in train_schema.fields() {
        if field.name() != target && !test_schema.has_column_with_unqualified_name(field.name()) {
            return Err(WorkbenchError::SchemaMismatch(format!(
                "Column '{}' exists in train but not in test",
                field.name()
            )));
        }
    }
    Ok(())
}
