//! ## Custom Errors for Feature Workbench
//!
//! This module defines the error type shared by every dataset operation.
//! It uses the `thiserror` crate to derive the `Error` trait.
//! The `WorkbenchError` enum covers the failure modes of the operations (missing columns,
//! incompatible value kinds, unmapped ordinal values, column name clashes, train/test schema drift)
//! plus wrappers for errors bubbling up from DataFusion and Arrow.
//!
//! The `WorkbenchResult` type alias is the result type returned throughout the library.
//!
//! ### Example
//!
//! ```rust
//! use feature_workbench::exceptions::{WorkbenchError, WorkbenchResult};
//!
//! fn lookup(name: &str) -> WorkbenchResult<()> {
//!     Err(WorkbenchError::MissingColumn(name.into()))
//! }
//! ```

use thiserror::Error;

/// Errors specific to the Feature Workbench library.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// A referenced column is absent from the train or the test table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// An operation was applied to a column holding an incompatible kind of value.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// An ordinal mapping has no entry for a value found in the data.
    #[error("Key lookup failed: {0}")]
    KeyLookup(String),

    /// A new column would overwrite an existing one while overwriting is disabled.
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Train and test no longer share the same columns (target excluded) or compatible types.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// An invalid parameter was provided (e.g. a percentile out of range or a malformed regex).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A pipeline step failed; `source` holds the error raised by the step.
    #[error("Error in operation '{step}': {source}")]
    OperationFailed {
        step: String,
        #[source]
        source: Box<WorkbenchError>,
    },
}

/// A convenient result type for Feature Workbench operations.
pub type WorkbenchResult<T> = std::result::Result<T, WorkbenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datafusion_error() {
        let df_err = datafusion::error::DataFusionError::Plan("test plan error".into());
        let err: WorkbenchError = df_err.into();
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("DataFusion error:"));
        assert!(err_msg.contains("test plan error"));
    }

    #[test]
    fn test_arrow_error() {
        let arrow_err = arrow::error::ArrowError::ComputeError("test compute error".into());
        let err: WorkbenchError = arrow_err.into();
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("Arrow error:"));
        assert!(err_msg.contains("test compute error"));
    }

    #[test]
    fn test_missing_column_error() {
        let err = WorkbenchError::MissingColumn("Cabin".into());
        assert_eq!(format!("{}", err), "Missing column: Cabin");
    }

    #[test]
    fn test_type_mismatch_error() {
        let err = WorkbenchError::TypeMismatch("column 'Name' is not numeric".into());
        let err_msg = format!("{}", err);
        assert!(err_msg.starts_with("Type mismatch:"));
        assert!(err_msg.contains("Name"));
    }

    #[test]
    fn test_key_lookup_error() {
        let err = WorkbenchError::KeyLookup("no mapping for 'Q'".into());
        assert!(format!("{}", err).contains("Key lookup failed:"));
    }

    #[test]
    fn test_duplicate_and_schema_errors() {
        let dup = WorkbenchError::DuplicateColumn("Fare".into());
        assert!(format!("{}", dup).contains("Duplicate column: Fare"));
        let schema = WorkbenchError::SchemaMismatch("test lacks 'Age'".into());
        assert!(format!("{}", schema).contains("Schema mismatch:"));
    }

    #[test]
    fn test_invalid_parameter_error() {
        let err = WorkbenchError::InvalidParameter("bad param".into());
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("Invalid parameter:"));
        assert!(err_msg.contains("bad param"));
    }

    #[test]
    fn test_operation_failed_keeps_source() {
        use std::error::Error as _;
        let err = WorkbenchError::OperationFailed {
            step: "drop_id".into(),
            source: Box::new(WorkbenchError::MissingColumn("id".into())),
        };
        assert!(format!("{}", err).contains("Error in operation 'drop_id'"));
        assert!(err.source().is_some());
    }
}
