//! ## Transformers for creating new features
//!
//! This module provides transformers that derive features by applying arithmetic and formatting
//! operations on existing features.
//!
//! Currently, the following transformers are implemented:
//!
//! - **AddConstant:** Adds a number to every value of a numeric feature, in place.
//! - **Arithmetic:** Creates a feature as the sum, difference, product or quotient of two numeric
//!   features. Division is done in `Float64`; division by zero and infinite quotients become 0.
//! - **RoundFeature:** Creates a feature by rounding a numeric feature to a number of decimal places.
//!   Halves are rounded away from zero, so `2.5` rounds to `3`.
//! - **ConcatFeatures:** Creates a text feature by joining the text of two features with a separator.
//!
//! Every transformer is applied identically to the train and the test table.

use crate::dataset::{ColumnKind, Dataset};
use crate::exceptions::{WorkbenchError, WorkbenchResult};
use crate::impl_operation;
use crate::transformers::helpers::project_with;
use arrow::datatypes::DataType;
use datafusion::logical_expr::{Case as DFCase, Expr};
use datafusion::scalar::ScalarValue;
use datafusion_expr::{cast, ident, lit};
use datafusion_functions::{math, string};

/// Adds a constant to every value of a numeric feature.
pub struct AddConstant {
    pub column: String,
    pub number: ScalarValue,
}

impl AddConstant {
    pub fn new(column: impl Into<String>, number: impl Into<ScalarValue>) -> Self {
        Self {
            column: column.into(),
            number: number.into(),
        }
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        if !self.number.data_type().is_numeric() {
            return Err(WorkbenchError::InvalidParameter(format!(
                "Cannot add non-numeric value {} to column '{}'",
                self.number, self.column
            )));
        }
        dataset.require_columns(&[self.column.as_str()])?;
        dataset.require_numeric(&self.column)?;
        let expr = || ident(self.column.as_str()) + lit(self.number.clone());
        let train = project_with(dataset.train().clone(), &self.column, expr())?;
        let test = project_with(dataset.test().clone(), &self.column, expr())?;
        dataset.commit(train, test)
    }
}

/// Elementwise operations available to [`Arithmetic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Sum,        // a + b
    Difference, // a - b
    Product,    // a * b
    Division,   // a / b, 0 where b is 0 or the quotient is infinite
}

/// Creates `new` from two numeric features.
pub struct Arithmetic {
    pub op: ArithmeticOp,
    pub new: String,
    pub a: String,
    pub b: String,
}

impl Arithmetic {
    pub fn new(
        op: ArithmeticOp,
        new: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
    ) -> Self {
        Self {
            op,
            new: new.into(),
            a: a.into(),
            b: b.into(),
        }
    }

    fn expr(&self) -> Expr {
        let (a, b) = (ident(self.a.as_str()), ident(self.b.as_str()));
        match self.op {
            ArithmeticOp::Sum => a + b,
            ArithmeticOp::Difference => a - b,
            ArithmeticOp::Product => a * b,
            ArithmeticOp::Division => {
                let divisor = cast(b, DataType::Float64);
                let quotient = cast(a, DataType::Float64) / divisor.clone();
                let infinite = quotient
                    .clone()
                    .eq(lit(f64::INFINITY))
                    .or(quotient.clone().eq(lit(f64::NEG_INFINITY)));
                Expr::Case(DFCase {
                    expr: None,
                    when_then_expr: vec![
                        (Box::new(divisor.eq(lit(0.0_f64))), Box::new(lit(0.0_f64))),
                        (Box::new(infinite), Box::new(lit(0.0_f64))),
                    ],
                    else_expr: Some(Box::new(quotient)),
                })
            }
        }
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        dataset.require_columns(&[self.a.as_str(), self.b.as_str()])?;
        dataset.require_numeric(&self.a)?;
        dataset.require_numeric(&self.b)?;
        dataset.check_new_column(&self.new)?;
        let train = project_with(dataset.train().clone(), &self.new, self.expr())?;
        let test = project_with(dataset.test().clone(), &self.new, self.expr())?;
        dataset.commit(train, test)
    }
}

/// Creates `new` by rounding a numeric feature to `precision` decimal places.
pub struct RoundFeature {
    pub new: String,
    pub column: String,
    pub precision: i64,
}

impl RoundFeature {
    pub fn new(new: impl Into<String>, column: impl Into<String>, precision: i64) -> Self {
        Self {
            new: new.into(),
            column: column.into(),
            precision,
        }
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        dataset.require_columns(&[self.column.as_str()])?;
        dataset.require_numeric(&self.column)?;
        dataset.check_new_column(&self.new)?;
        let expr = || {
            math::round().call(vec![
                cast(ident(self.column.as_str()), DataType::Float64),
                lit(self.precision),
            ])
        };
        let train = project_with(dataset.train().clone(), &self.new, expr())?;
        let test = project_with(dataset.test().clone(), &self.new, expr())?;
        dataset.commit(train, test)
    }
}

/// Creates the text feature `new` as `a` + `sep` + `b`. Values are cast to text first; nulls
/// contribute empty text.
pub struct ConcatFeatures {
    pub new: String,
    pub a: String,
    pub sep: String,
    pub b: String,
}

impl ConcatFeatures {
    pub fn new(
        new: impl Into<String>,
        a: impl Into<String>,
        sep: impl Into<String>,
        b: impl Into<String>,
    ) -> Self {
        Self {
            new: new.into(),
            a: a.into(),
            sep: sep.into(),
            b: b.into(),
        }
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<()> {
        dataset.require_columns(&[self.a.as_str(), self.b.as_str()])?;
        for name in [&self.a, &self.b] {
            if dataset.column_kind(name)? == ColumnKind::List {
                return Err(WorkbenchError::TypeMismatch(format!(
                    "Cannot concatenate list column '{}'",
                    name
                )));
            }
        }
        dataset.check_new_column(&self.new)?;
        let expr = || {
            string::concat().call(vec![
                cast(ident(self.a.as_str()), DataType::Utf8),
                lit(self.sep.as_str()),
                cast(ident(self.b.as_str()), DataType::Utf8),
            ])
        };
        let train = project_with(dataset.train().clone(), &self.new, expr())?;
        let test = project_with(dataset.test().clone(), &self.new, expr())?;
        dataset.commit(train, test)
    }
}

impl_operation!(AddConstant);
impl_operation!(Arithmetic);
impl_operation!(RoundFeature);
impl_operation!(ConcatFeatures);
