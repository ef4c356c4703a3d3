//! ## Operation Pipeline
//!
//! This module provides the abstractions for running a sequence of dataset operations as one
//! workflow.
//!
//! ### Overview
//!
//! - The [`Operation`] trait is the common interface of every transformer: apply yourself to a
//!   [`Dataset`] and optionally report what changed.
//! - The [`Pipeline`] struct runs named operations in order against the same dataset, collecting
//!   their summaries.
//! - Macros [`crate::impl_operation`] and [`crate::make_pipeline`] simplify implementing the trait
//!   and building pipelines.

use crate::dataset::Dataset;
use crate::exceptions::{WorkbenchError, WorkbenchResult};
use async_trait::async_trait;
use std::time::Instant;
use tracing::info;

/// Trait for steps of an operation pipeline.
#[async_trait]
pub trait Operation {
    /// Apply the operation to the dataset in place.
    ///
    /// # Returns
    ///
    /// * `WorkbenchResult<Option<String>>` - A human-readable summary for operations that report
    ///   one, `None` for pure mutations.
    async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<Option<String>>;
}

/// Converts the result of a transformer's inherent `apply` into an optional summary line.
pub trait IntoSummary {
    fn into_summary(self) -> Option<String>;
}

impl IntoSummary for () {
    fn into_summary(self) -> Option<String> {
        None
    }
}

/// Macro to implement the [`Operation`] trait for Feature Workbench transformers.
///
/// The type must already have an inherent
/// `async fn apply(&self, &mut Dataset) -> WorkbenchResult<T>` where `T: IntoSummary`.
///
/// # Example
///
/// ```rust,ignore
/// impl_operation!(DropFeatures);
/// ```
#[macro_export]
macro_rules! impl_operation {
    ($ty:ty) => {
        #[async_trait::async_trait]
        impl $crate::pipeline::Operation for $ty {
            async fn apply(
                &self,
                dataset: &mut $crate::dataset::Dataset,
            ) -> $crate::exceptions::WorkbenchResult<Option<String>> {
                <$ty>::apply(self, dataset)
                    .await
                    .map($crate::pipeline::IntoSummary::into_summary)
            }
        }
    };
}

/// Macro to implement [`IntoSummary`] for report types through their `Display` output.
#[macro_export]
macro_rules! impl_summary {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::pipeline::IntoSummary for $ty {
                fn into_summary(self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )+
    };
}

/// A pipeline that applies a sequence of operations to one dataset.
pub struct Pipeline {
    steps: Vec<(String, Box<dyn Operation + Send + Sync>)>,
    verbose: bool,
}

impl Pipeline {
    /// Creates a new pipeline.
    ///
    /// # Arguments
    ///
    /// * `steps` - A vector of (name, operation) pairs (each operation is already boxed).
    /// * `verbose` - If true, logs the duration of each step.
    pub fn new(steps: Vec<(String, Box<dyn Operation + Send + Sync>)>, verbose: bool) -> Self {
        Self { steps, verbose }
    }

    /// Number of steps in the pipeline.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Applies each step in order and returns the (step name, summary) pairs.
    ///
    /// The first failing step stops the run; steps already applied stay applied.
    pub async fn run(
        &self,
        dataset: &mut Dataset,
    ) -> WorkbenchResult<Vec<(String, Option<String>)>> {
        if self.steps.is_empty() {
            return Err(WorkbenchError::InvalidParameter(
                "Pipeline must have at least one operation.".to_string(),
            ));
        }
        let mut summaries = Vec::with_capacity(self.steps.len());
        for (name, step) in &self.steps {
            let start = Instant::now();
            let summary = step
                .apply(dataset)
                .await
                .map_err(|e| WorkbenchError::OperationFailed {
                    step: name.clone(),
                    source: Box::new(e),
                })?;
            if self.verbose {
                info!(step = %name, elapsed = ?start.elapsed(), "step completed");
            }
            if let Some(line) = &summary {
                info!(step = %name, "{}", line);
            }
            summaries.push((name.clone(), summary));
        }
        Ok(summaries)
    }
}

/// Macro to simplify pipeline creation by automatically boxing operations.
///
/// # Example
///
/// ```rust,no_run
/// use feature_workbench::make_pipeline;
/// use feature_workbench::transformers::imputation::Imputer;
///
/// let pipeline = make_pipeline!(false,
///     ("impute", Imputer::new()),
/// );
/// ```
#[macro_export]
macro_rules! make_pipeline {
    ($verbose:expr, $(($name:expr, $operation:expr)),+ $(,)?) => {
        {
            let steps: Vec<(String, Box<dyn $crate::pipeline::Operation + Send + Sync>)> = vec![
                $(
                    ($name.to_string(), Box::new($operation)),
                )+
            ];
            $crate::pipeline::Pipeline::new(steps, $verbose)
        }
    };
}
