//! Expression builders and statistics shared by the transformers.

use crate::exceptions::{WorkbenchError, WorkbenchResult};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::cast as cast_array;
use arrow::datatypes::DataType;
use datafusion::functions_aggregate::expr_fn::{count, median};
use datafusion::logical_expr::{Case as DFCase, Expr};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use datafusion_expr::{cast, ident, lit};
use datafusion_functions::math;
use std::cmp::Ordering;

/// Projects every column of `df`, replacing the column `name` with `expr` in place or appending it
/// when absent.
pub(crate) fn project_with(df: DataFrame, name: &str, expr: Expr) -> WorkbenchResult<DataFrame> {
    let mut replacement = Some(expr);
    let mut exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .map(|field| {
            if field.name() == name {
                replacement
                    .take()
                    .map_or_else(|| ident(name), |e| e.alias(name))
            } else {
                ident(field.name().as_str())
            }
        })
        .collect();
    if let Some(expr) = replacement {
        exprs.push(expr.alias(name));
    }
    df.select(exprs).map_err(WorkbenchError::from)
}

/// `CASE WHEN <col> IS NOT NULL THEN <col> ELSE <fallback> END`.
pub(crate) fn coalesce_expr_for(name: &str, fallback: Expr) -> Expr {
    Expr::Case(DFCase {
        expr: None,
        when_then_expr: vec![(Box::new(ident(name).is_not_null()), Box::new(ident(name)))],
        else_expr: Some(Box::new(fallback)),
    })
}

/// Builds `CASE WHEN <col> = <key> THEN <value> ... ELSE <default> END`.
/// Without a default, unmatched rows become null.
pub(crate) fn build_case_expr(
    col_name: &str,
    mapping: &[(ScalarValue, ScalarValue)],
    default: Option<Expr>,
) -> Expr {
    if mapping.is_empty() {
        return default.unwrap_or_else(|| lit(ScalarValue::Null));
    }
    let when_then_expr = mapping
        .iter()
        .map(|(key, value)| {
            (
                Box::new(ident(col_name).eq(lit(key.clone()))),
                Box::new(lit(value.clone())),
            )
        })
        .collect();
    Expr::Case(DFCase {
        expr: None,
        when_then_expr,
        else_expr: default.map(Box::new),
    })
}

/// `CASE WHEN <base> > <threshold> THEN <threshold> ELSE <base> END` for an upper bound, and the
/// mirror image for a lower bound.
pub(crate) fn clamp_expr(base: Expr, threshold: f64, upper: bool) -> Expr {
    let condition = if upper {
        base.clone().gt(lit(threshold))
    } else {
        base.clone().lt(lit(threshold))
    };
    Expr::Case(DFCase {
        expr: None,
        when_then_expr: vec![(Box::new(condition), Box::new(lit(threshold)))],
        else_expr: Some(Box::new(base)),
    })
}

/// Distinct non-null values of a column.
pub(crate) async fn distinct_values(
    df: &DataFrame,
    col_name: &str,
) -> WorkbenchResult<Vec<ScalarValue>> {
    let batches = df
        .clone()
        .select(vec![ident(col_name)])?
        .distinct()?
        .collect()
        .await?;
    let mut values = Vec::new();
    for batch in batches {
        let array = batch.column(0);
        for i in 0..array.len() {
            if !array.is_null(i) {
                values.push(ScalarValue::try_from_array(array, i)?);
            }
        }
    }
    Ok(values)
}

/// Occurrence count of each distinct non-null value of a column.
pub(crate) async fn value_counts(
    df: &DataFrame,
    col_name: &str,
) -> WorkbenchResult<Vec<(ScalarValue, i64)>> {
    let batches = df
        .clone()
        .aggregate(
            vec![ident(col_name)],
            vec![count(ident(col_name)).alias("__count")],
        )?
        .collect()
        .await?;
    let mut counts = Vec::new();
    for batch in batches {
        let values = batch.column(0);
        let count_array = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| {
                WorkbenchError::DataFusionError(datafusion::error::DataFusionError::Plan(
                    "Expected Int64 array".into(),
                ))
            })?;
        for i in 0..batch.num_rows() {
            if !values.is_null(i) {
                counts.push((ScalarValue::try_from_array(values, i)?, count_array.value(i)));
            }
        }
    }
    Ok(counts)
}

/// Number of nulls in each column, in schema order.
pub(crate) async fn null_counts(df: &DataFrame) -> WorkbenchResult<Vec<(String, i64)>> {
    let names: Vec<String> = df
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    let mut aggregates = vec![count(lit(1)).alias("__rows")];
    aggregates.extend(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| count(ident(name.as_str())).alias(format!("__non_null_{}", i))),
    );
    let batches = df.clone().aggregate(vec![], aggregates)?.collect().await?;
    let batch = batches.first().ok_or_else(|| {
        WorkbenchError::DataFusionError(datafusion::error::DataFusionError::Plan(
            "No data found when counting nulls".into(),
        ))
    })?;
    let read = |i: usize| -> WorkbenchResult<i64> {
        match ScalarValue::try_from_array(batch.column(i), 0)? {
            ScalarValue::Int64(Some(v)) => Ok(v),
            other => Err(WorkbenchError::DataFusionError(
                datafusion::error::DataFusionError::Plan(format!(
                    "Expected an Int64 count, got {:?}",
                    other
                )),
            )),
        }
    };
    let rows = read(0)?;
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Ok((name, rows - read(i + 1)?)))
        .collect()
}

/// Total number of nulls across all columns.
pub(crate) async fn count_missing(df: &DataFrame) -> WorkbenchResult<i64> {
    Ok(null_counts(df).await?.iter().map(|(_, n)| n).sum())
}

/// Non-null values of a numeric column, cast to `f64`.
pub(crate) async fn numeric_values(df: &DataFrame, col_name: &str) -> WorkbenchResult<Vec<f64>> {
    let batches = df
        .clone()
        .select(vec![cast(ident(col_name), DataType::Float64).alias(col_name)])?
        .collect()
        .await?;
    let mut values = Vec::new();
    for batch in batches {
        let array = batch
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                WorkbenchError::TypeMismatch(format!(
                    "Expected Float64 values for column {}",
                    col_name
                ))
            })?;
        values.extend(array.iter().flatten().filter(|v| !v.is_nan()));
    }
    Ok(values)
}

/// Exact median of a numeric column over the union of `frames`, computed with an aggregate query.
/// Nulls and NaNs are ignored; returns `None` when no value is left.
pub(crate) async fn median_of(
    frames: &[&DataFrame],
    col_name: &str,
) -> WorkbenchResult<Option<f64>> {
    let mut values: Option<DataFrame> = None;
    for df in frames {
        let projected = (*df)
            .clone()
            .select(vec![cast(ident(col_name), DataType::Float64).alias(col_name)])?;
        values = Some(match values {
            Some(acc) => acc.union(projected)?,
            None => projected,
        });
    }
    let Some(values) = values else {
        return Ok(None);
    };
    let not_nan = Expr::Not(Box::new(math::isnan().call(vec![ident(col_name)])));
    let batches = values
        .filter(not_nan)?
        .aggregate(vec![], vec![median(ident(col_name)).alias("__median")])?
        .collect()
        .await?;
    match batches.first() {
        Some(batch) if batch.num_rows() > 0 => {
            match ScalarValue::try_from_array(batch.column(0), 0)? {
                ScalarValue::Float64(value) => Ok(value),
                other => Err(WorkbenchError::DataFusionError(
                    datafusion::error::DataFusionError::Plan(format!(
                        "Failed to compute median for column {}: got {:?}",
                        col_name, other
                    )),
                )),
            }
        }
        _ => Ok(None),
    }
}

/// Percentile (0-100) of the values using linear interpolation between closest ranks.
/// Returns `None` for an empty slice.
pub(crate) fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let (lo, hi) = (sorted[lower], sorted[upper]);
    Some(lo + (hi - lo) * (rank - lower as f64))
}

/// Most frequent value; ties go to the smallest value.
pub(crate) fn mode(counts: &[(ScalarValue, i64)]) -> Option<ScalarValue> {
    counts
        .iter()
        .max_by(|(a_val, a_cnt), (b_val, b_cnt)| {
            a_cnt
                .cmp(b_cnt)
                .then_with(|| b_val.partial_cmp(a_val).unwrap_or(Ordering::Equal))
        })
        .map(|(value, _)| value.clone())
}

/// Casts `value` to `data_type`, reporting failures as a type mismatch on `col_name`.
pub(crate) fn cast_scalar(
    value: &ScalarValue,
    data_type: &DataType,
    col_name: &str,
) -> WorkbenchResult<ScalarValue> {
    if value.is_null() || value.data_type() == *data_type {
        return Ok(value.clone());
    }
    value.cast_to(data_type).map_err(|e| {
        WorkbenchError::TypeMismatch(format!(
            "Value {} does not fit column '{}' of type {}: {}",
            value, col_name, data_type, e
        ))
    })
}

/// Views any text-like array (Utf8, LargeUtf8, Utf8View, dictionary) as a `StringArray`.
pub(crate) fn as_strings(array: &ArrayRef) -> WorkbenchResult<StringArray> {
    let utf8 = cast_array(array, &DataType::Utf8)?;
    utf8.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| WorkbenchError::TypeMismatch("Expected a Utf8 array".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn test_percentile_linear_interpolation() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_relative_eq!(percentile(&values, 95.0).unwrap(), 95.05, epsilon = 1e-9);
        assert_relative_eq!(percentile(&values, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile(&values, 100.0).unwrap(), 100.0);
        assert_relative_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 50.0).unwrap(), 2.5);
        assert!(percentile(&[], 50.0).is_none());
    }

    #[test]
    fn test_mode_prefers_smallest_on_ties() {
        let counts = vec![
            (ScalarValue::from("S"), 3),
            (ScalarValue::from("C"), 3),
            (ScalarValue::from("Q"), 1),
        ];
        assert_eq!(mode(&counts), Some(ScalarValue::from("C")));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn test_cast_scalar() {
        let v = cast_scalar(&ScalarValue::from(3_i32), &DataType::Int64, "a").unwrap();
        assert_eq!(v, ScalarValue::Int64(Some(3)));
        let err = cast_scalar(&ScalarValue::from("abc"), &DataType::Int64, "a");
        assert!(matches!(err, Err(WorkbenchError::TypeMismatch(_))));
    }

    #[test]
    fn test_build_case_expr_without_mapping_uses_default() {
        let expr = build_case_expr("a", &[], Some(lit(0_i64)));
        assert_eq!(expr, lit(0_i64));
    }

    #[test]
    fn test_as_strings_handles_large_utf8() {
        let array: ArrayRef = Arc::new(arrow::array::LargeStringArray::from(vec!["x", "y"]));
        let strings = as_strings(&array).unwrap();
        assert_eq!(strings.value(1), "y");
    }
}
