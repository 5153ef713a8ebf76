use std::path::PathBuf;

use reconql_core::ConnectionConfig;
use reconql_dialect_sqlite::SqliteDialect;
use reconql_testkit::{TestResult, load_test_cases_from_path, run_test_with_connection};

fn fixture_path(file_name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(file_name)
}

#[test]
fn sqlite_reconcile_scenarios_pass() {
    let path = fixture_path("reconcile.yml");
    let cases = load_test_cases_from_path(&path)
        .unwrap_or_else(|error| panic!("failed to load '{}': {error}", path.display()));
    assert!(!cases.is_empty(), "fixture must define at least one testcase");

    let connection = ConnectionConfig::for_database(":memory:");
    let mut skipped = Vec::new();

    for (case_name, case) in &cases {
        match run_test_with_connection(&SqliteDialect, &connection, case) {
            TestResult::Passed => {}
            TestResult::Skipped(reason) => skipped.push((case_name.clone(), reason)),
            TestResult::Failed(reason) => panic!("testcase '{case_name}' failed: {reason}"),
        }
    }

    assert_eq!(
        skipped.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
        vec!["postgres_only_case_is_skipped_elsewhere"]
    );
}
