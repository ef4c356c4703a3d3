//! ## Transformers for handling outliers
//!
//! - **OutlierFixer:** Caps the values of a numeric train column at percentile thresholds computed
//!   from train.
//!
//! Capping is applied to the train table only; test rows are left as they are. The upper bound is
//! applied first and the lower threshold is computed on the already capped values.

use crate::dataset::Dataset;
use crate::exceptions::{WorkbenchError, WorkbenchResult};
use crate::transformers::helpers::{clamp_expr, numeric_values, percentile, project_with};
use crate::{impl_operation, impl_summary};
use datafusion_expr::ident;
use std::fmt;
use tracing::info;

/// Which side of the distribution a threshold caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// Result of capping one side of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierFix {
    pub bound: Bound,
    pub threshold: f64,
    /// Number of train rows whose value was replaced by the threshold.
    pub changed: usize,
    /// `changed` as a percentage of all train rows.
    pub percent: f64,
}

impl fmt::Display for OutlierFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} or {:.2}% outliers fixed.", self.changed, self.percent)
    }
}

/// Outcome of [`OutlierFixer`], one entry per requested bound (upper first).
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub column: String,
    pub fixes: Vec<OutlierFix>,
}

impl OutlierReport {
    /// Total number of train values changed.
    pub fn changed(&self) -> usize {
        self.fixes.iter().map(|fix| fix.changed).sum()
    }
}

impl fmt::Display for OutlierReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.fixes.iter().map(ToString::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// Caps train values of `column` below the `lower` or above the `upper` percentile (0 to 100).
pub struct OutlierFixer {
    pub column: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl OutlierFixer {
    pub fn new(column: impl Into<String>, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self {
            column: column.into(),
            lower,
            upper,
        }
    }

    fn validate(&self) -> WorkbenchResult<()> {
        for (label, pct) in [("lower", self.lower), ("upper", self.upper)] {
            if let Some(p) = pct {
                if !(0.0..=100.0).contains(&p) {
                    return Err(WorkbenchError::InvalidParameter(format!(
                        "{} percentile {} must be between 0 and 100",
                        label, p
                    )));
                }
            }
        }
        Ok(())
    }

    pub async fn apply(&self, dataset: &mut Dataset) -> WorkbenchResult<OutlierReport> {
        self.validate()?;
        dataset.require_columns(&[self.column.as_str()])?;
        dataset.require_numeric(&self.column)?;

        let mut report = OutlierReport {
            column: self.column.clone(),
            fixes: Vec::new(),
        };
        let requested: Vec<(Bound, f64)> = [(Bound::Upper, self.upper), (Bound::Lower, self.lower)]
            .into_iter()
            .filter_map(|(bound, pct)| pct.map(|p| (bound, p)))
            .collect();
        if requested.is_empty() {
            return Ok(report);
        }

        let rows = dataset.train().clone().count().await?;
        let mut values = numeric_values(dataset.train(), &self.column).await?;
        let mut expr = ident(self.column.as_str());
        for (bound, pct) in requested {
            let threshold = percentile(&values, pct).ok_or_else(|| {
                WorkbenchError::InvalidParameter(format!(
                    "Column '{}' has no values to compute a percentile from",
                    self.column
                ))
            })?;
            let is_outlier = |v: f64| match bound {
                Bound::Upper => v > threshold,
                Bound::Lower => v < threshold,
            };
            let changed = values.iter().filter(|&&v| is_outlier(v)).count();
            for v in values.iter_mut() {
                if is_outlier(*v) {
                    *v = threshold;
                }
            }
            expr = clamp_expr(expr, threshold, bound == Bound::Upper);

            let fix = OutlierFix {
                bound,
                threshold,
                changed,
                percent: if rows == 0 {
                    0.0
                } else {
                    changed as f64 / rows as f64 * 100.0
                },
            };
            info!(column = %self.column, ?bound, threshold, "{}", fix);
            report.fixes.push(fix);
        }

        let train = project_with(dataset.train().clone(), &self.column, expr)?;
        let test = dataset.test().clone();
        dataset.commit(train, test)?;
        Ok(report)
    }
}

impl_summary!(OutlierReport);
impl_operation!(OutlierFixer);
