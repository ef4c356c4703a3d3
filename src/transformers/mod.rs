//! # Transformer Implementations
//!
//! The submodules contain one transformer per dataset operation, grouped by feature engineering task.
//! Every transformer has an async `apply(&self, &mut Dataset)` method and implements
//! [`crate::pipeline::Operation`].

pub mod categorical_encoding;
pub mod feature_creation;
pub mod feature_selection;
pub(crate) mod helpers;
pub mod imputation;
pub mod outlier_handling;
pub mod text_features;
