//! ## Logging Configuration
//!
//! This module sets up logging automatically at program startup using the `ctor` crate.
//! Logging behavior is controlled by the `DEBUG_FEATURE_WORKBENCH` environment variable:
//!
//! - **Disabled** (default): If the variable is unset, empty, or explicitly set to `"0"` or `"false"`,
//!   no logging will be initialized.
//! - **Enabled**: Any other value enables logging with a maximum log level of `DEBUG`.
//!
//! Operations emit computed statistics at `DEBUG` and their summaries (including outlier
//! diagnostics) at `INFO`.
//!
//! ### Usage Example
//!
//! ```sh
//! export DEBUG_FEATURE_WORKBENCH=true
//! ```

use crate::settings::{logging_enabled, DEBUG_ENV_VAR};
use ctor::ctor;
use tracing::Level;

#[ctor]
fn set_debug_level() {
    let value = std::env::var(DEBUG_ENV_VAR).ok();
    if logging_enabled(value.as_deref()) {
        // A subscriber may already be installed by the host application.
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .try_init();
    }
}
