#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::{cast, concat};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use datafusion::prelude::DataFrame;
use feature_workbench::dataset::Dataset;

pub fn arr<A: Array + 'static>(array: A) -> ArrayRef {
    Arc::new(array)
}

/// Builds a dataset from (name, array) pairs; `train` must carry `target`, `test` must not.
pub fn dataset(
    train: Vec<(&str, ArrayRef)>,
    test: Vec<(&str, ArrayRef)>,
    target: &str,
) -> Dataset {
    let train = RecordBatch::try_from_iter(train).unwrap();
    let test = RecordBatch::try_from_iter(test).unwrap();
    Dataset::from_batches(train, test, target).unwrap()
}

/// A small passenger table: train has 4 rows with the `survived` target, test has 2 rows.
pub fn passengers() -> Dataset {
    dataset(
        vec![
            ("id", arr(Int64Array::from(vec![1, 2, 3, 4]))),
            ("first", arr(StringArray::from(vec!["Jane", "John", "Ann", "Bob"]))),
            ("last", arr(StringArray::from(vec!["Doe", "Roe", "Lee", "Kim"]))),
            ("fare", arr(Float64Array::from(vec![7.25, 71.28, 8.05, 53.1]))),
            ("survived", arr(Int64Array::from(vec![0, 1, 1, 0]))),
        ],
        vec![
            ("id", arr(Int64Array::from(vec![5, 6]))),
            ("first", arr(StringArray::from(vec!["Eve", "Max"]))),
            ("last", arr(StringArray::from(vec!["Fox", "Ng"]))),
            ("fare", arr(Float64Array::from(vec![8.46, 21.07]))),
        ],
        "survived",
    )
}

async fn column(df: &DataFrame, name: &str, data_type: &DataType) -> ArrayRef {
    let batches = df.clone().collect().await.unwrap();
    let arrays: Vec<ArrayRef> = batches
        .iter()
        .map(|b| cast(b.column_by_name(name).unwrap(), data_type).unwrap())
        .collect();
    if arrays.is_empty() {
        return arrow::array::new_empty_array(data_type);
    }
    let refs: Vec<&dyn Array> = arrays.iter().map(|a| a.as_ref()).collect();
    concat(&refs).unwrap()
}

pub async fn column_f64(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    let array = column(df, name, &DataType::Float64).await;
    let values = array.as_any().downcast_ref::<Float64Array>().unwrap();
    values.iter().collect()
}

pub async fn column_i64(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    let array = column(df, name, &DataType::Int64).await;
    let values = array.as_any().downcast_ref::<Int64Array>().unwrap();
    values.iter().collect()
}

pub async fn column_str(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    let array = column(df, name, &DataType::Utf8).await;
    let values = array.as_any().downcast_ref::<StringArray>().unwrap();
    values.iter().map(|v| v.map(str::to_string)).collect()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}
