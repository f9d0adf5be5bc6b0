//! End-to-end ingestion tests against real files and SQLite databases

mod common;

use cbi_ingest::{
    Cleaner, DelimitedParser, Delimiter, IngestError, Normalizer, Persister, Pipeline,
    PipelineConfig, SqlitePersister,
};
use common::{column_values, count_rows, fail_inserts_where, fixture, table_exists, write_source};
use tempfile::TempDir;

#[test]
fn test_missing_age_row_is_cleaned_and_constant_score_normalizes_to_zero() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "people.csv", "Name,Age,Score\nAlice,30,85\nBob,,90\n");

    let parsed = DelimitedParser::new(Delimiter::COMMA).parse_file(&path).unwrap();
    assert_eq!(parsed.dataset.len(), 2);

    let cleaned = Cleaner::default().clean(&parsed.dataset).unwrap();
    assert_eq!(cleaned.dataset.len(), 1);
    assert_eq!(cleaned.dataset.value(0, "Name"), Some("Alice"));

    let normalized = Normalizer::new(["Score"]).normalize(&cleaned.dataset).unwrap();
    assert_eq!(normalized.dataset.value(0, "Score"), Some("0.0"));
    assert_eq!(normalized.ranges[0].min, 85.0);
    assert_eq!(normalized.ranges[0].max, 85.0);
}

#[test]
fn test_malformed_line_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "ab.csv", "A,B\n1,2\n3,x\n5,6\n7\n");

    let parsed = DelimitedParser::default().parse_file(&path).unwrap();

    assert_eq!(parsed.dataset.len(), 3);
    assert_eq!(parsed.skipped_lines, 1);
    assert!(parsed
        .dataset
        .records()
        .iter()
        .all(|r| r.values().len() == parsed.dataset.columns().len()));
}

#[test]
fn test_values_normalize_to_unit_interval_and_persist_as_text() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("behavior.db");
    let path = write_source(&dir, "scores.csv", "Id,Score\na,10\nb,20\nc,30\n");

    let config = PipelineConfig::for_file(path)
        .with_numeric_columns(["Score"])
        .with_table("Scores")
        .with_database_path(&db);
    let summary = Pipeline::sqlite(config).run().unwrap();

    assert_eq!(summary.rows_persisted, 3);
    assert_eq!(column_values(&db, "Scores", "Score"), ["0.0", "0.5", "1.0"]);
    assert_eq!(column_values(&db, "Scores", "Id"), ["a", "b", "c"]);
}

#[test]
fn test_forced_insert_failure_keeps_only_first_run() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("behavior.db");
    let path = write_source(&dir, "people.csv", "Name,Age\nAlice,30\nBob,41\nCarol,25\n");
    let config = PipelineConfig::for_file(path)
        .with_table("People")
        .with_database_path(&db);

    let first = Pipeline::sqlite(config.clone()).run().unwrap();
    assert_eq!(first.rows_persisted, 3);
    assert_eq!(count_rows(&db, "People"), 3);

    fail_inserts_where(&db, "People", "Name", "Bob");
    let err = Pipeline::sqlite(config).run().unwrap_err();

    assert_eq!(err.failed_record(), Some(1));
    assert!(err.to_string().contains("People"));
    assert_eq!(count_rows(&db, "People"), 3);
}

#[test]
fn test_csv_and_txt_sources_share_one_table() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("customer_behavior.db");

    let csv = PipelineConfig::for_file(fixture("sample_data.csv"))
        .with_table("CustomerData")
        .with_numeric_columns(["Age", "Score"])
        .with_outlier_columns(["Spend"])
        .with_database_path(&db);
    let summary = Pipeline::sqlite(csv).run().unwrap();

    assert_eq!(summary.rows_parsed, 5);
    assert_eq!(summary.lines_skipped, 1);
    assert_eq!(summary.rows_dropped_missing, 1);
    assert_eq!(summary.rows_dropped_outliers, 1);
    assert_eq!(summary.rows_persisted, 3);
    assert_eq!(
        column_values(&db, "CustomerData", "CustomerID"),
        ["C001", "C005", "C006"]
    );
    assert_eq!(
        column_values(&db, "CustomerData", "Age"),
        ["0.0", "0.22727272727272727", "1.0"]
    );

    let txt = PipelineConfig::for_file(fixture("sample_data.txt"))
        .with_delimiter(Delimiter::TAB)
        .with_table("CustomerData")
        .with_database_path(&db);
    let summary = Pipeline::sqlite(txt).run().unwrap();

    assert_eq!(summary.rows_persisted, 2);
    assert_eq!(summary.table_rows, 5);
    assert_eq!(count_rows(&db, "CustomerData"), 5);
}

#[test]
fn test_unsupported_extension_fails_before_reading() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("behavior.db");
    let config = PipelineConfig::for_file(dir.path().join("report.xlsx")).with_database_path(&db);

    let err = Pipeline::sqlite(config).run().unwrap_err();

    assert!(matches!(err, IngestError::UnsupportedFormat { ref extension, .. } if extension == "xlsx"));
    assert!(!db.exists());
}

#[test]
fn test_missing_source_is_io_error() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::for_file(dir.path().join("absent.csv"))
        .with_database_path(dir.path().join("behavior.db"));

    let err = Pipeline::sqlite(config).run().unwrap_err();

    match err {
        IngestError::Io { path, .. } => assert!(path.ends_with("absent.csv")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_empty_file_is_empty_dataset_error() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "empty.txt", "");
    let config = PipelineConfig::for_file(path).with_database_path(dir.path().join("behavior.db"));

    let err = Pipeline::sqlite(config).run().unwrap_err();
    assert!(matches!(err, IngestError::EmptyDataset { .. }));
}

#[test]
fn test_fully_cleaned_dataset_creates_no_table() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("behavior.db");
    let path = write_source(&dir, "gaps.csv", "Name,Age\nAlice,\n,30\n");
    let config = PipelineConfig::for_file(path)
        .with_table("Gaps")
        .with_database_path(&db);

    let err = Pipeline::sqlite(config).run().unwrap_err();

    assert!(matches!(err, IngestError::EmptySchema { ref table } if table == "Gaps"));
    assert!(!table_exists(&db, "Gaps"));
}

#[test]
fn test_numeric_error_names_column_and_row_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("behavior.db");
    let path = write_source(&dir, "bad.csv", "Name,Score\nAlice,85\nBob,high\n");
    let config = PipelineConfig::for_file(path)
        .with_numeric_columns(["Score"])
        .with_database_path(&db);

    let err = Pipeline::sqlite(config).run().unwrap_err();

    match err {
        IngestError::NumericParse { column, row, value } => {
            assert_eq!(column, "Score");
            assert_eq!(row, 1);
            assert_eq!(value, "high");
        },
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!db.exists());
}

#[test]
fn test_persister_trait_object() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("behavior.db");
    let path = write_source(&dir, "people.csv", "Name\nAlice\n");
    let dataset = DelimitedParser::default().parse_file(&path).unwrap().dataset;

    let persister: Box<dyn Persister> = Box::new(SqlitePersister::new(&db));
    let report = persister.persist(&dataset, "People").unwrap();

    assert_eq!(report.rows_inserted, 1);
    assert_eq!(count_rows(&db, "People"), 1);
}

#[test]
fn test_plan_reports_ddl_without_creating_database() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("behavior.db");
    let config = PipelineConfig::for_file(fixture("sample_data.csv"))
        .with_table("CustomerData")
        .with_database_path(&db);

    let plan = Pipeline::sqlite(config).plan().unwrap();

    assert_eq!(plan.rows, 4);
    assert!(plan
        .table
        .create_table_sql()
        .starts_with(r#"CREATE TABLE IF NOT EXISTS "CustomerData" ("CustomerID" TEXT"#));
    assert!(!db.exists());
}
