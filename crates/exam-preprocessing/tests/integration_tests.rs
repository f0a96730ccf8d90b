//! Integration tests for the exam preprocessor.
//!
//! These tests verify end-to-end behavior on the student exam fixtures.

use exam_preprocessing::transformation::read_csv;
use exam_preprocessing::{
    ColumnTransformer, DataTransformation, LogContext, LoggingConfig, PreprocessingError,
    PreprocessorBuilder, PreprocessorConfig,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    read_csv(fixtures_path().join(filename)).expect("Failed to read CSV file")
}

fn load_train() -> DataFrame {
    load_csv("students_train.csv")
}

fn load_test() -> DataFrame {
    load_csv("students_test.csv")
}

fn build(config: PreprocessorConfig) -> ColumnTransformer {
    PreprocessorBuilder::new(config).build().unwrap()
}

fn fitted_default() -> ColumnTransformer {
    let mut preprocessor = build(PreprocessorConfig::default());
    preprocessor.fit(&load_train()).unwrap();
    preprocessor
}

fn config_in(dir: &Path) -> PreprocessorConfig {
    PreprocessorConfig::builder()
        .artifact_path(dir.join("artifacts").join("preprocessor.bin"))
        .build()
        .unwrap()
}

fn values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

fn row(df: &DataFrame, index: usize) -> Vec<f64> {
    df.get_columns()
        .iter()
        .map(|c| {
            c.as_materialized_series()
                .f64()
                .unwrap()
                .get(index)
                .unwrap()
        })
        .collect()
}

fn bits(df: &DataFrame) -> Vec<Vec<u64>> {
    df.get_columns()
        .iter()
        .map(|c| {
            c.as_materialized_series()
                .f64()
                .unwrap()
                .into_no_null_iter()
                .map(f64::to_bits)
                .collect()
        })
        .collect()
}

/// A two-row frame with the default schema, identical except for `vary`.
fn pair(vary: &str) -> DataFrame {
    let mut df = df![
        "gender" => [Some("female"), Some("female")],
        "race_ethnicity" => ["group B", "group B"],
        "parental_level_of_education" => ["high school", "high school"],
        "lunch" => ["standard", "standard"],
        "test_preparation_course" => ["none", "none"],
        "reading_score" => [Some(64i64), Some(64)],
        "writing_score" => [Some(67i64), Some(67)],
    ]
    .unwrap();

    let replaced = match vary {
        "gender" => Column::new("gender".into(), [None::<&str>, Some("female")]),
        "reading_score" => Column::new("reading_score".into(), [None::<i64>, Some(64)]),
        "writing_score" => Column::new("writing_score".into(), [None::<i64>, Some(67)]),
        other => panic!("unexpected column {}", other),
    };
    df.with_column(replaced).unwrap();
    df
}

// ============================================================================
// Output Shape Tests
// ============================================================================

#[test]
fn test_output_width_is_numeric_plus_categories() {
    let mut preprocessor = build(PreprocessorConfig::default());
    let out = preprocessor.fit_transform(&load_train()).unwrap();

    // 2 numeric + gender 2 + race 5 + parental 6 + lunch 2 + prep 2
    assert_eq!(out.width(), 19);
    assert_eq!(out.height(), 20);
    assert_eq!(preprocessor.n_features_out().unwrap(), 19);
}

#[test]
fn test_feature_names_follow_group_then_category_order() {
    let names = fitted_default().feature_names_out().unwrap();

    assert_eq!(
        names,
        vec![
            "writing_score",
            "reading_score",
            "gender_female",
            "gender_male",
            "race_ethnicity_group A",
            "race_ethnicity_group B",
            "race_ethnicity_group C",
            "race_ethnicity_group D",
            "race_ethnicity_group E",
            "parental_level_of_education_associate's degree",
            "parental_level_of_education_bachelor's degree",
            "parental_level_of_education_high school",
            "parental_level_of_education_master's degree",
            "parental_level_of_education_some college",
            "parental_level_of_education_some high school",
            "lunch_free/reduced",
            "lunch_standard",
            "test_preparation_course_completed",
            "test_preparation_course_none",
        ]
    );
}

#[test]
fn test_output_has_no_missing_values() {
    let out = fitted_default().transform(&load_test()).unwrap();
    assert_eq!(out.height(), 6);
    for col in out.get_columns() {
        assert_eq!(col.null_count(), 0, "column {} has nulls", col.name());
        assert_eq!(col.dtype(), &DataType::Float64);
    }
}

// ============================================================================
// Stage Semantics Tests
// ============================================================================

#[test]
fn test_numeric_columns_are_standardized_on_train() {
    let mut preprocessor = build(PreprocessorConfig::default());
    let out = preprocessor.fit_transform(&load_train()).unwrap();

    for name in ["writing_score", "reading_score"] {
        let v = values(&out, name);
        let n = v.len() as f64;
        let mean = v.iter().sum::<f64>() / n;
        let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9, "{} mean {}", name, mean);
        assert!((var.sqrt() - 1.0).abs() < 1e-9, "{} std {}", name, var.sqrt());
    }
}

#[test]
fn test_categorical_indicators_are_not_centered() {
    let out = fitted_default().transform(&load_test()).unwrap();

    // Row 0 is male: the female indicator stays exactly zero after scaling
    let female = values(&out, "gender_female");
    let male = values(&out, "gender_male");
    assert_eq!(female[0], 0.0);
    assert!(male[0] > 0.0);
    for (f, m) in female.iter().zip(&male) {
        assert!(*f >= 0.0 && *m >= 0.0);
    }
}

#[test]
fn test_missing_numeric_is_filled_with_train_median() {
    let preprocessor = fitted_default();

    for column in ["reading_score", "writing_score"] {
        let out = preprocessor.transform(&pair(column)).unwrap();
        assert_eq!(row(&out, 0), row(&out, 1), "{} not filled with median", column);
    }
}

#[test]
fn test_missing_category_is_filled_with_train_mode() {
    let out = fitted_default().transform(&pair("gender")).unwrap();
    assert_eq!(row(&out, 0), row(&out, 1));
}

#[test]
fn test_unknown_category_is_rejected_by_default() {
    let mut df = pair("gender");
    df.with_column(Column::new("lunch".into(), ["premium", "standard"]))
        .unwrap();

    let err = fitted_default().transform(&df).unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_CATEGORY");
    assert!(matches!(
        err.root_cause(),
        PreprocessingError::UnknownCategory { column, value } if column == "lunch" && value == "premium"
    ));
}

#[test]
fn test_unknown_category_can_be_ignored() {
    let config = PreprocessorConfig::builder()
        .error_on_unknown_category(false)
        .build()
        .unwrap();
    let mut preprocessor = build(config);
    preprocessor.fit(&load_train()).unwrap();

    let mut df = pair("gender");
    df.with_column(Column::new("lunch".into(), ["premium", "standard"]))
        .unwrap();
    let out = preprocessor.transform(&df).unwrap();

    assert_eq!(values(&out, "lunch_standard")[0], 0.0);
    assert_eq!(values(&out, "lunch_free/reduced")[0], 0.0);
    assert!(values(&out, "lunch_standard")[1] > 0.0);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn test_na_tokens_in_csv_are_imputed() {
    let with_tokens = load_csv("students_train_na.csv");
    let reading = with_tokens.column("reading_score").unwrap();
    assert_eq!(reading.dtype(), &DataType::Int64);
    assert_eq!(reading.null_count(), 1);

    let mut from_tokens = build(PreprocessorConfig::default());
    let train_out = from_tokens.fit_transform(&with_tokens).unwrap();
    let reference = fitted_default();

    let test = load_test();
    assert_eq!(
        bits(&from_tokens.transform(&test).unwrap()),
        bits(&reference.transform(&test).unwrap())
    );
    assert_eq!(
        bits(&train_out),
        bits(&reference.transform(&load_train()).unwrap())
    );
}

#[test]
fn test_transform_before_fit_is_not_fitted() {
    let preprocessor = build(PreprocessorConfig::default());
    let err = preprocessor.transform(&load_test()).unwrap_err();
    assert!(matches!(err, PreprocessingError::NotFitted(_)));
}

#[test]
fn test_refit_is_idempotent() {
    let train = load_train();
    let test = load_test();
    let mut preprocessor = build(PreprocessorConfig::default());

    preprocessor.fit(&train).unwrap();
    let first = preprocessor.transform(&test).unwrap();
    preprocessor.fit(&train).unwrap();
    let second = preprocessor.transform(&test).unwrap();

    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn test_extra_columns_are_dropped() {
    let preprocessor = fitted_default();
    let test = load_test();

    let mut with_extra = test.clone();
    with_extra
        .with_column(Column::new("student_id".into(), (0..6i64).collect::<Vec<_>>()))
        .unwrap();

    let plain = preprocessor.transform(&test).unwrap();
    let extra = preprocessor.transform(&with_extra).unwrap();
    assert!(plain.equals(&extra));
    assert!(extra.column("student_id").is_err());
    assert!(extra.column("math_score").is_err());
}

#[test]
fn test_missing_schema_column_is_reported() {
    let test = load_test().drop("lunch").unwrap();
    let err = fitted_default().transform(&test).unwrap_err();
    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
}

#[test]
fn test_persisted_preprocessor_is_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("artifacts").join("preprocessor.bin");
    let preprocessor = fitted_default();
    preprocessor.save(&path).unwrap();

    let reloaded = ColumnTransformer::load(&path).unwrap();
    let test = load_test();

    assert_eq!(
        bits(&preprocessor.transform(&test).unwrap()),
        bits(&reloaded.transform(&test).unwrap())
    );
}

#[test]
fn test_unfit_preprocessor_cannot_be_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preprocessor.bin");
    let err = build(PreprocessorConfig::default()).save(&path).unwrap_err();
    assert!(err.is_not_fitted());
    assert!(!path.exists());
}

// ============================================================================
// Data Transformation Run Tests
// ============================================================================

#[test]
fn test_data_transformation_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let output = DataTransformation::new(config_in(dir.path()))
        .from_csv(
            fixtures_path().join("students_train.csv"),
            fixtures_path().join("students_test.csv"),
        )
        .unwrap();

    assert_eq!(output.train.shape(), (20, 20));
    assert_eq!(output.test.shape(), (6, 20));
    assert_eq!(
        output.test.get_column_names().last().map(|s| s.as_str()),
        Some("math_score")
    );
    assert_eq!(values(&output.test, "math_score"), vec![81.0, 55.0, 62.0, 77.0, 49.0, 70.0]);

    assert_eq!(output.summary.n_features, 19);
    assert!(output.artifact_path.exists());

    let reloaded = ColumnTransformer::load(&output.artifact_path).unwrap();
    let features = reloaded.transform(&load_test()).unwrap();
    assert_eq!(
        bits(&features),
        bits(&output.test.drop("math_score").unwrap())
    );
}

#[test]
fn test_summary_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = DataTransformation::new(config_in(dir.path()))
        .initiate(&load_train(), &load_test())
        .unwrap();

    let json = serde_json::to_value(&output.summary).unwrap();
    assert_eq!(json["train_rows"], 20);
    assert_eq!(json["n_features"], 19);
    assert_eq!(json["target_column"], "math_score");
    assert_eq!(json["feature_names"][0], "writing_score");
}

#[test]
fn test_run_writes_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let logs = LogContext::init(&LoggingConfig {
        log_dir: dir.path().join("logs"),
        ..Default::default()
    })
    .unwrap();

    DataTransformation::new(config_in(dir.path()))
        .with_log_context(logs.clone())
        .initiate(&load_train(), &load_test())
        .unwrap();

    // MM_DD_YYYY_HH_MM_SS.log
    let file_name = logs.log_file().file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(file_name.len(), "01_01_2024_00_00_00.log".len());
    assert!(
        file_name
            .trim_end_matches(".log")
            .chars()
            .all(|c| c.is_ascii_digit() || c == '_')
    );

    let text = std::fs::read_to_string(logs.log_file()).unwrap();
    assert!(text.contains(
        "exam_preprocessing::pipeline::builder - INFO - Numerical columns: [\"writing_score\", \"reading_score\"]"
    ));
    assert!(text.contains("exam_preprocessing::transformation - INFO - Obtaining preprocessing object"));
    assert!(text.lines().all(|line| line.starts_with("[ ")));
}
