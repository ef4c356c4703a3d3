//! ## Feature operations on a dataset
//!
//! [`FeatureTransformer`] borrows a [`Dataset`] mutably and exposes every operation as a method.
//! Each call validates its inputs, applies the transformation to both tables, and commits the
//! result; on error the dataset is left as it was before the call.
//!
//! ### Example
//!
//! ```rust,no_run
//! use feature_workbench::dataset::Dataset;
//! use feature_workbench::exceptions::WorkbenchResult;
//!
//! async fn engineer(dataset: &mut Dataset) -> WorkbenchResult<()> {
//!     let mut features = dataset.features();
//!     features.fillna("Embarked", "S").await?;
//!     features.concat("full_name", "first", " ", "last").await?;
//!     features.labels(&["Sex", "Embarked"]).await?;
//!     let summary = features.drop(&["PassengerId"]).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

use crate::dataset::Dataset;
use crate::exceptions::WorkbenchResult;
use crate::transformers::categorical_encoding::{
    DensityEncoder, LabelEncoder, OrdinalMapper, ReplaceValues,
};
use crate::transformers::feature_creation::{
    AddConstant, Arithmetic, ArithmeticOp, ConcatFeatures, RoundFeature,
};
use crate::transformers::feature_selection::{DropFeatures, DropSummary};
use crate::transformers::imputation::{FillMissing, ImputeSummary, Imputer};
use crate::transformers::outlier_handling::{OutlierFixer, OutlierReport};
use crate::transformers::text_features::{ListLength, RegexExtract, WordCount};
use datafusion::scalar::ScalarValue;

/// Applies feature engineering operations to a borrowed [`Dataset`].
pub struct FeatureTransformer<'a> {
    dataset: &'a mut Dataset,
}

impl<'a> FeatureTransformer<'a> {
    pub fn new(dataset: &'a mut Dataset) -> Self {
        Self { dataset }
    }

    /// The dataset being transformed.
    pub fn dataset(&self) -> &Dataset {
        self.dataset
    }

    /// Drops `features` from train and test.
    pub async fn drop<S: AsRef<str>>(&mut self, features: &[S]) -> WorkbenchResult<DropSummary> {
        DropFeatures::new(features.iter().map(|s| s.as_ref()))
            .apply(self.dataset)
            .await
    }

    /// Fills missing values with medians (numeric) or most frequent values (text).
    pub async fn impute(&mut self) -> WorkbenchResult<ImputeSummary> {
        Imputer::new().apply(self.dataset).await
    }

    /// Replaces the values of `column` according to `mapping`.
    pub async fn ordinal_to_numeric<K, V>(
        &mut self,
        column: &str,
        mapping: impl IntoIterator<Item = (K, V)>,
    ) -> WorkbenchResult<()>
    where
        K: Into<ScalarValue>,
        V: Into<ScalarValue>,
    {
        OrdinalMapper::new(column, mapping).apply(self.dataset).await
    }

    /// Replaces missing values of `column` with `value`.
    pub async fn fillna(
        &mut self,
        column: &str,
        value: impl Into<ScalarValue>,
    ) -> WorkbenchResult<()> {
        FillMissing::new(column, value).apply(self.dataset).await
    }

    /// Replaces each value of `column` found in `matches` with `value`.
    pub async fn replace<M: Into<ScalarValue>>(
        &mut self,
        column: &str,
        matches: impl IntoIterator<Item = M>,
        value: impl Into<ScalarValue>,
    ) -> WorkbenchResult<()> {
        ReplaceValues::new(column, matches, value)
            .apply(self.dataset)
            .await
    }

    /// Caps train values of `column` at the `lower` and/or `upper` percentile.
    pub async fn outliers_fix(
        &mut self,
        column: &str,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> WorkbenchResult<OutlierReport> {
        OutlierFixer::new(column, lower, upper)
            .apply(self.dataset)
            .await
    }

    /// Adds `<column>_density` holding train value frequencies.
    pub async fn density(&mut self, column: &str) -> WorkbenchResult<()> {
        DensityEncoder::new(column).apply(self.dataset).await
    }

    /// Adds `number` to every value of `column`.
    pub async fn add(&mut self, column: &str, number: impl Into<ScalarValue>) -> WorkbenchResult<()> {
        AddConstant::new(column, number).apply(self.dataset).await
    }

    /// Creates `new` = `a` + `b`.
    pub async fn sum(&mut self, new: &str, a: &str, b: &str) -> WorkbenchResult<()> {
        self.arithmetic(ArithmeticOp::Sum, new, a, b).await
    }

    /// Creates `new` = `a` - `b`.
    pub async fn diff(&mut self, new: &str, a: &str, b: &str) -> WorkbenchResult<()> {
        self.arithmetic(ArithmeticOp::Difference, new, a, b).await
    }

    /// Creates `new` = `a` * `b`.
    pub async fn product(&mut self, new: &str, a: &str, b: &str) -> WorkbenchResult<()> {
        self.arithmetic(ArithmeticOp::Product, new, a, b).await
    }

    /// Creates `new` = `a` / `b`, with 0 wherever `b` is 0 or the quotient is infinite.
    pub async fn divide(&mut self, new: &str, a: &str, b: &str) -> WorkbenchResult<()> {
        self.arithmetic(ArithmeticOp::Division, new, a, b).await
    }

    async fn arithmetic(
        &mut self,
        op: ArithmeticOp,
        new: &str,
        a: &str,
        b: &str,
    ) -> WorkbenchResult<()> {
        Arithmetic::new(op, new, a, b).apply(self.dataset).await
    }

    /// Creates `new` by rounding `column` to `precision` decimal places.
    pub async fn round(&mut self, new: &str, column: &str, precision: i64) -> WorkbenchResult<()> {
        RoundFeature::new(new, column, precision)
            .apply(self.dataset)
            .await
    }

    /// Creates the text feature `new` = `a` + `sep` + `b`.
    pub async fn concat(&mut self, new: &str, a: &str, sep: &str, b: &str) -> WorkbenchResult<()> {
        ConcatFeatures::new(new, a, sep, b)
            .apply(self.dataset)
            .await
    }

    /// Creates `new` holding the item count of list feature `column`.
    pub async fn list_len(&mut self, new: &str, column: &str) -> WorkbenchResult<()> {
        ListLength::new(new, column).apply(self.dataset).await
    }

    /// Creates `new` holding the word count of text feature `column`.
    pub async fn word_count(&mut self, new: &str, column: &str) -> WorkbenchResult<()> {
        WordCount::new(new, column).apply(self.dataset).await
    }

    /// Extracts the first capture group of `regex` from `column` into `new`, or into `column`
    /// itself when `new` is `None`.
    pub async fn regex_extract(
        &mut self,
        column: &str,
        regex: &str,
        new: Option<&str>,
    ) -> WorkbenchResult<()> {
        RegexExtract::new(column, regex, new)
            .apply(self.dataset)
            .await
    }

    /// Label encodes each of `features` with codes shared by train and test.
    pub async fn labels<S: AsRef<str>>(&mut self, features: &[S]) -> WorkbenchResult<()> {
        LabelEncoder::new(features.iter().map(|s| s.as_ref()))
            .apply(self.dataset)
            .await
    }
}

impl Dataset {
    /// Starts a sequence of feature operations on this dataset.
    pub fn features(&mut self) -> FeatureTransformer<'_> {
        FeatureTransformer::new(self)
    }
}
