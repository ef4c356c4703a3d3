mod shared;

use approx::assert_relative_eq;
use arrow::array::{Float64Array, Int64Array, ListArray, StringArray};
use arrow::datatypes::Int32Type;
use feature_workbench::exceptions::{WorkbenchError, WorkbenchResult};
use feature_workbench::transformers::feature_creation::{Arithmetic, ArithmeticOp, RoundFeature};
use feature_workbench::Dataset;
use shared::{arr, column_f64, column_i64, column_names, column_str, dataset, passengers};

fn pairs() -> Dataset {
    dataset(
        vec![
            ("a", arr(Int64Array::from(vec![1, 4, 0, 6]))),
            ("b", arr(Int64Array::from(vec![0, 2, 0, 3]))),
            ("y", arr(Int64Array::from(vec![0, 1, 0, 1]))),
        ],
        vec![
            ("a", arr(Int64Array::from(vec![9, -2]))),
            ("b", arr(Int64Array::from(vec![3, 0]))),
        ],
        "y",
    )
}

#[tokio::test]
async fn test_add_constant_in_place() -> WorkbenchResult<()> {
    let mut ds = passengers();
    ds.features().add("fare", 10.0).await?;
    let fares = column_f64(ds.test(), "fare").await;
    assert_relative_eq!(fares[0].unwrap(), 18.46, epsilon = 1e-9);
    assert_relative_eq!(fares[1].unwrap(), 31.07, epsilon = 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_add_to_text_column_fails() {
    let mut ds = passengers();
    let result = ds.features().add("first", 1_i64).await;
    assert!(matches!(result, Err(WorkbenchError::TypeMismatch(_))));
}

#[tokio::test]
async fn test_sum_diff_product() -> WorkbenchResult<()> {
    let mut ds = pairs();
    let mut features = ds.features();
    features.sum("s", "a", "b").await?;
    features.diff("d", "a", "b").await?;
    features.product("p", "a", "b").await?;

    assert_eq!(
        column_i64(ds.train(), "s").await,
        vec![Some(1), Some(6), Some(0), Some(9)]
    );
    assert_eq!(
        column_i64(ds.train(), "d").await,
        vec![Some(1), Some(2), Some(0), Some(3)]
    );
    assert_eq!(column_i64(ds.test(), "p").await, vec![Some(27), Some(0)]);
    Ok(())
}

#[tokio::test]
async fn test_divide_by_zero_yields_zero() -> WorkbenchResult<()> {
    let mut ds = pairs();
    Arithmetic::new(ArithmeticOp::Division, "ratio", "a", "b")
        .apply(&mut ds)
        .await?;
    assert_eq!(
        column_f64(ds.train(), "ratio").await,
        vec![Some(0.0), Some(2.0), Some(0.0), Some(2.0)]
    );
    assert_eq!(
        column_f64(ds.test(), "ratio").await,
        vec![Some(3.0), Some(0.0)]
    );
    Ok(())
}

#[tokio::test]
async fn test_arithmetic_on_missing_column_fails() {
    let mut ds = pairs();
    let result = ds.features().divide("ratio", "a", "c").await;
    assert!(matches!(result, Err(WorkbenchError::MissingColumn(_))));
}

#[tokio::test]
async fn test_round_is_idempotent() -> WorkbenchResult<()> {
    let mut ds = passengers();
    ds.features().round("fare_r", "fare", 1).await?;
    RoundFeature::new("fare_rr", "fare_r", 1)
        .apply(&mut ds)
        .await?;
    let once = column_f64(ds.train(), "fare_r").await;
    let twice = column_f64(ds.train(), "fare_rr").await;
    assert_eq!(once, twice);
    assert_relative_eq!(once[1].unwrap(), 71.3, epsilon = 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_concat_two_features() -> WorkbenchResult<()> {
    let mut ds = passengers();
    ds.features().concat("full", "first", " ", "last").await?;
    assert_eq!(
        column_str(ds.train(), "full").await[0].as_deref(),
        Some("Jane Doe")
    );
    assert_eq!(
        column_str(ds.test(), "full").await,
        vec![Some("Eve Fox".into()), Some("Max Ng".into())]
    );
    Ok(())
}

#[tokio::test]
async fn test_concat_casts_numbers_to_text() -> WorkbenchResult<()> {
    let mut ds = dataset(
        vec![
            ("name", arr(StringArray::from(vec!["a", "b"]))),
            ("n", arr(Int64Array::from(vec![1, 22]))),
            ("y", arr(Float64Array::from(vec![0.0, 1.0]))),
        ],
        vec![
            ("name", arr(StringArray::from(vec!["c"]))),
            ("n", arr(Int64Array::from(vec![3]))),
        ],
        "y",
    );
    ds.features().concat("key", "name", "-", "n").await?;
    assert_eq!(
        column_str(ds.train(), "key").await,
        vec![Some("a-1".into()), Some("b-22".into())]
    );
    Ok(())
}

#[tokio::test]
async fn test_new_column_cannot_shadow_target() {
    let mut ds = pairs();
    let result = ds.features().sum("y", "a", "b").await;
    assert!(matches!(result, Err(WorkbenchError::InvalidParameter(_))));
}

#[tokio::test]
async fn test_divide_overflow_yields_zero() -> WorkbenchResult<()> {
    let mut ds = dataset(
        vec![
            ("a", arr(Float64Array::from(vec![1e308, -1e308, 3.0]))),
            ("b", arr(Float64Array::from(vec![1e-10, 1e-10, 1.5]))),
            ("y", arr(Int64Array::from(vec![0, 1, 0]))),
        ],
        vec![
            ("a", arr(Float64Array::from(vec![1e308]))),
            ("b", arr(Float64Array::from(vec![1e-300]))),
        ],
        "y",
    );
    ds.features().divide("ratio", "a", "b").await?;
    assert_eq!(
        column_f64(ds.train(), "ratio").await,
        vec![Some(0.0), Some(0.0), Some(2.0)]
    );
    assert_eq!(column_f64(ds.test(), "ratio").await, vec![Some(0.0)]);
    Ok(())
}

#[tokio::test]
async fn test_arithmetic_on_text_column_fails() {
    let mut ds = passengers();
    let result = ds.features().sum("s", "fare", "first").await;
    assert!(matches!(result, Err(WorkbenchError::TypeMismatch(_))));
    let result = ds.features().divide("d", "last", "fare").await;
    assert!(matches!(result, Err(WorkbenchError::TypeMismatch(_))));
}

#[tokio::test]
async fn test_concat_of_list_column_fails() {
    let train = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1)])]);
    let test = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(2)])]);
    let mut ds = dataset(
        vec![
            ("items", arr(train)),
            ("name", arr(StringArray::from(vec!["a"]))),
            ("y", arr(Int64Array::from(vec![1]))),
        ],
        vec![
            ("items", arr(test)),
            ("name", arr(StringArray::from(vec!["b"]))),
        ],
        "y",
    );
    let result = ds.features().concat("key", "name", "-", "items").await;
    assert!(matches!(result, Err(WorkbenchError::TypeMismatch(_))));
    assert!(!column_names(ds.train()).contains(&"key".to_string()));
}

#[tokio::test]
async fn test_round_halves_away_from_zero() -> WorkbenchResult<()> {
    let mut ds = dataset(
        vec![
            ("v", arr(Float64Array::from(vec![2.5, -2.5, 0.5]))),
            ("y", arr(Int64Array::from(vec![0, 1, 0]))),
        ],
        vec![("v", arr(Float64Array::from(vec![1.5])))],
        "y",
    );
    ds.features().round("r", "v", 0).await?;
    assert_eq!(
        column_f64(ds.train(), "r").await,
        vec![Some(3.0), Some(-3.0), Some(1.0)]
    );
    assert_eq!(column_f64(ds.test(), "r").await, vec![Some(2.0)]);
    Ok(())
}
