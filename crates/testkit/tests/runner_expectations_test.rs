use reconql_core::{ConnectionConfig, Dialect};
use reconql_dialect_sqlite::SqliteDialect;
use reconql_testkit::{TestCase, TestResult, run_test, run_test_with_connection};

fn in_memory() -> ConnectionConfig {
    ConnectionConfig::for_database(":memory:")
}

#[test]
fn mismatched_expectation_fails_with_a_reason() {
    let case = TestCase {
        script: "CREATE TABLE metadata_ledger (sequence_id INTEGER, modified_at TEXT, actor TEXT, affected_tables TEXT, affected_columns TEXT, remarks TEXT);\nCREATE TABLE a (id INTEGER);".to_string(),
        created: Some(vec!["a".to_string()]),
        ..TestCase::default()
    };

    let result = run_test_with_connection(&SqliteDialect, &in_memory(), &case);

    assert!(
        matches!(&result, TestResult::Failed(reason) if reason.starts_with("created:")),
        "got {result:?}"
    );
}

#[test]
fn unexpected_success_fails_when_an_error_was_expected() {
    let case = TestCase {
        script: "CREATE TABLE metadata_ledger (sequence_id INTEGER, modified_at TEXT, actor TEXT, affected_tables TEXT, affected_columns TEXT, remarks TEXT);".to_string(),
        error: Some("below the minimum".to_string()),
        ..TestCase::default()
    };

    let result = run_test_with_connection(&SqliteDialect, &in_memory(), &case);

    assert!(matches!(result, TestResult::Failed(_)), "got {result:?}");
}

#[test]
fn setup_failure_is_reported_before_reconciling() {
    let adapter = SqliteDialect
        .connect(&in_memory())
        .expect("in-memory sqlite should open");
    let case = TestCase {
        setup: "INSERT INTO nowhere VALUES (1);".to_string(),
        ..TestCase::default()
    };

    let result = run_test(&SqliteDialect, adapter.as_ref(), &case);

    assert!(
        matches!(&result, TestResult::Failed(reason) if reason.starts_with("setup statement failed")),
        "got {result:?}"
    );
}

#[test]
fn non_idempotent_script_is_caught_by_the_rerun_check() {
    // A keep-less drop run recreates every table each time.
    let case = TestCase {
        script: "CREATE TABLE metadata_ledger (sequence_id INTEGER, modified_at TEXT, actor TEXT, affected_tables TEXT, affected_columns TEXT, remarks TEXT);".to_string(),
        overwrite: "drop".to_string(),
        idempotent: true,
        ..TestCase::default()
    };

    let result = run_test_with_connection(&SqliteDialect, &in_memory(), &case);

    assert!(
        matches!(&result, TestResult::Failed(reason) if reason.contains("second run")),
        "got {result:?}"
    );
}
