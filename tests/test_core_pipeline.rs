mod shared;

use feature_workbench::exceptions::{WorkbenchError, WorkbenchResult};
use feature_workbench::make_pipeline;
use feature_workbench::pipeline::{Operation, Pipeline};
use feature_workbench::transformers::categorical_encoding::{DensityEncoder, LabelEncoder};
use feature_workbench::transformers::feature_creation::ConcatFeatures;
use feature_workbench::transformers::feature_selection::DropFeatures;
use feature_workbench::transformers::outlier_handling::OutlierFixer;
use shared::{column_i64, column_names, column_str, passengers};

#[tokio::test]
async fn test_pipeline_runs_steps_in_order() -> WorkbenchResult<()> {
    let mut ds = passengers();
    let pipeline = make_pipeline!(
        false,
        ("full_name", ConcatFeatures::new("full", "first", " ", "last")),
        ("drop_names", DropFeatures::new(["first", "last", "id"])),
        ("fare_cap", OutlierFixer::new("fare", None, Some(50.0))),
        ("label_full", LabelEncoder::new(["full"])),
    );
    assert_eq!(pipeline.len(), 4);

    let summaries = pipeline.run(&mut ds).await?;
    let names: Vec<&str> = summaries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["full_name", "drop_names", "fare_cap", "label_full"]);
    assert_eq!(summaries[0].1, None);
    assert_eq!(
        summaries[1].1.as_deref(),
        Some("Dropped 3 features with 3 features available.")
    );
    assert!(summaries[2].1.as_deref().unwrap().ends_with("outliers fixed."));

    assert_eq!(column_names(ds.train()), vec!["fare", "survived", "full"]);
    assert_eq!(column_names(ds.test()), vec!["fare", "full"]);
    // Codes are shared with test: "Jane Doe" is the fourth of six sorted names.
    assert_eq!(column_i64(ds.train(), "full").await[0], Some(3));
    Ok(())
}

#[tokio::test]
async fn test_pipeline_error_names_the_failing_step() {
    let mut ds = passengers();
    let pipeline = make_pipeline!(
        true,
        ("density", DensityEncoder::new("first")),
        ("drop", DropFeatures::new(["cabin"])),
        ("never", DropFeatures::new(["id"])),
    );
    let err = pipeline.run(&mut ds).await.unwrap_err();
    match &err {
        WorkbenchError::OperationFailed { step, source } => {
            assert_eq!(step, "drop");
            assert!(matches!(**source, WorkbenchError::MissingColumn(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().starts_with("Error in operation 'drop'"));
    // Steps before the failure stay applied, later ones never run.
    assert!(column_names(ds.train()).contains(&"first_density".to_string()));
    assert!(column_names(ds.train()).contains(&"id".to_string()));
}

#[tokio::test]
async fn test_empty_pipeline_is_rejected() {
    let mut ds = passengers();
    let pipeline = Pipeline::new(vec![], false);
    assert!(pipeline.is_empty());
    let result = pipeline.run(&mut ds).await;
    assert!(matches!(result, Err(WorkbenchError::InvalidParameter(_))));
}

#[tokio::test]
async fn test_operation_trait_object() -> WorkbenchResult<()> {
    let mut ds = passengers();
    let op: Box<dyn Operation + Send + Sync> =
        Box::new(ConcatFeatures::new("full", "first", "_", "last"));
    assert_eq!(op.apply(&mut ds).await?, None);
    assert_eq!(
        column_str(ds.test(), "full").await,
        vec![Some("Eve_Fox".into()), Some("Max_Ng".into())]
    );
    Ok(())
}
