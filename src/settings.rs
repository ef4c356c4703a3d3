//! ## Settings
//!
//! Library-wide constants and the runtime options attached to a [`crate::dataset::Dataset`].

/// Environment variable that turns on debug logging (see [`crate::logging`]).
pub const DEBUG_ENV_VAR: &str = "DEBUG_FEATURE_WORKBENCH";

/// Suffix appended to a column name by the density encoder.
pub const DENSITY_SUFFIX: &str = "_density";

/// Options controlling how operations mutate a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetOptions {
    /// When false, creating a column whose name already exists fails with
    /// [`crate::exceptions::WorkbenchError::DuplicateColumn`] instead of replacing it.
    pub allow_overwrite: bool,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            allow_overwrite: true,
        }
    }
}

/// Interprets the value of [`DEBUG_ENV_VAR`]. Unset, empty, `"0"` and `"false"` disable logging.
pub fn logging_enabled(value: Option<&str>) -> bool {
    !value.map_or(true, |v| v == "0" || v == "false" || v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_enabled() {
        assert!(!logging_enabled(None));
        assert!(!logging_enabled(Some("")));
        assert!(!logging_enabled(Some("0")));
        assert!(!logging_enabled(Some("false")));
        assert!(logging_enabled(Some("1")));
        assert!(logging_enabled(Some("true")));
    }

    #[test]
    fn test_default_options_allow_overwrite() {
        assert!(DatasetOptions::default().allow_overwrite);
    }
}
