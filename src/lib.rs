//! # Feature Workbench
//!
//! Feature engineering operations over a paired train/test dataset, built on Apache DataFusion.
//!
//! A [`dataset::Dataset`] holds the train table (with the target column) and the test table
//! (without it). Operations such as dropping, imputing, encoding, arithmetic derivations, text
//! parsing and label encoding are applied to both tables at once and always leave their columns
//! in sync. Operations can be called one by one through [`feature::FeatureTransformer`] or chained
//! with a [`pipeline::Pipeline`].
//!
//! Logging is off by default; set `DEBUG_FEATURE_WORKBENCH=true` to enable it.

pub mod dataset;
pub mod exceptions;
pub mod feature;
mod logging;
pub mod pipeline;
pub mod settings;
pub mod transformers;

pub use dataset::{ColumnKind, Dataset};
pub use exceptions::{WorkbenchError, WorkbenchResult};
pub use feature::FeatureTransformer;
