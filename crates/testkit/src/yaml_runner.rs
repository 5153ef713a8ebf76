use std::{collections::BTreeMap, fs, io, path::Path};

use reconql_core::{
    BASE_SCHEMA_VERSION, ConnectionConfig, DatabaseAdapter, Dialect, KeepTables, Orchestrator,
    OverwritePolicy, ReconcileOptions, RunReport, TableName, TableSet, quote_identifier,
    split_statements, table_set,
};
use serde::Deserialize;
use thiserror::Error;

/// One reconciliation scenario: database state before the run, the script,
/// the invocation parameters, and what must hold afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestCase {
    /// Executed statement by statement before reconciling.
    pub setup: String,
    pub script: String,
    pub overwrite: String,
    /// `None` keeps whatever exists; `Some` is an explicit keep list.
    pub keep_tables: Option<Vec<String>>,
    pub target_version: Option<u32>,
    pub flavor: Option<String>,
    /// Substring of the error the run must fail with before executing.
    pub error: Option<String>,

    /// Exact non-system table inventory after the run.
    pub tables: Option<Vec<String>>,
    pub rows: BTreeMap<String, i64>,
    pub created: Option<Vec<String>>,
    pub dropped: Option<Vec<String>>,
    pub emptied: Option<Vec<String>>,
    pub pruned: Option<Vec<String>>,
    /// Number of statement failures the run reports.
    pub failures: usize,
    /// Runs the scenario a second time and requires it to change nothing.
    pub idempotent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read testcase file `{path}`")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid yaml testcase at line {}", line.map_or_else(|| "?".to_string(), |line| line.to_string()))]
    Yaml {
        line: Option<usize>,
        #[source]
        source: serde_yaml::Error,
    },
}

pub fn load_test_cases_from_str(yaml: &str) -> Result<BTreeMap<String, TestCase>, LoadError> {
    serde_yaml::from_str(yaml).map_err(|source| LoadError::Yaml {
        line: source.location().map(|location| location.line()),
        source,
    })
}

pub fn load_test_cases_from_path(path: &Path) -> Result<BTreeMap<String, TestCase>, LoadError> {
    let yaml = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_test_cases_from_str(&yaml)
}

pub fn matches_flavor(requirement: Option<&str>, current_flavor: &str) -> bool {
    let Some(requirement) = requirement.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };

    if let Some(excluded_flavor) = requirement.strip_prefix('!') {
        return excluded_flavor != current_flavor;
    }

    requirement == current_flavor
}

/// Connects a fresh adapter for the case, then runs it.
pub fn run_test_with_connection(
    dialect: &dyn Dialect,
    connection: &ConnectionConfig,
    test: &TestCase,
) -> TestResult {
    if !matches_flavor(test.flavor.as_deref(), dialect.name()) {
        return skipped_for_flavor(test, dialect.name());
    }
    match dialect.connect(connection) {
        Ok(adapter) => run_test(dialect, adapter.as_ref(), test),
        Err(error) => TestResult::Failed(format!("connect failed: {error}")),
    }
}

pub fn run_test(dialect: &dyn Dialect, adapter: &dyn DatabaseAdapter, test: &TestCase) -> TestResult {
    if !matches_flavor(test.flavor.as_deref(), dialect.name()) {
        return skipped_for_flavor(test, dialect.name());
    }
    match run_test_flow(dialect, adapter, test) {
        Ok(()) => TestResult::Passed,
        Err(reason) => TestResult::Failed(reason),
    }
}

fn skipped_for_flavor(test: &TestCase, current_flavor: &str) -> TestResult {
    TestResult::Skipped(format!(
        "requires flavor '{}', running on '{current_flavor}'",
        test.flavor.as_deref().unwrap_or_default()
    ))
}

fn run_test_flow(
    dialect: &dyn Dialect,
    adapter: &dyn DatabaseAdapter,
    test: &TestCase,
) -> Result<(), String> {
    for sql in split_statements(&test.setup) {
        adapter
            .execute(&sql)
            .map_err(|error| format!("setup statement failed: {error}"))?;
    }

    let options = reconcile_options(test)?;
    let orchestrator = Orchestrator::new(dialect);
    let outcome = orchestrator.run_with_adapter(adapter, &test.script, &options);

    let report = match (outcome, test.error.as_deref()) {
        (Err(error), Some(expected)) => {
            let message = error.to_string();
            return if message.contains(expected) {
                Ok(())
            } else {
                Err(format!("expected error containing `{expected}`, got `{message}`"))
            };
        }
        (Err(error), None) => return Err(format!("run failed: {error}")),
        (Ok(_), Some(expected)) => {
            return Err(format!("expected error containing `{expected}`, but the run succeeded"));
        }
        (Ok(report), None) => report,
    };

    verify_report(dialect, adapter, test, &report)?;

    if test.idempotent {
        let before = user_tables(dialect, adapter)?;
        let rerun = orchestrator
            .run_with_adapter(adapter, &test.script, &options)
            .map_err(|error| format!("second run failed: {error}"))?;
        verify_no_changes(&rerun)?;
        let after = user_tables(dialect, adapter)?;
        if before != after {
            return Err(format!(
                "second run changed the inventory: {} -> {}",
                join(&before),
                join(&after)
            ));
        }
    }

    Ok(())
}

fn reconcile_options(test: &TestCase) -> Result<ReconcileOptions, String> {
    let overwrite = test
        .overwrite
        .parse::<OverwritePolicy>()
        .map_err(|error| error.to_string())?;
    let keep_tables = match &test.keep_tables {
        Some(names) => KeepTables::listed(names).map_err(|error| error.to_string())?,
        None => KeepTables::Existing,
    };

    Ok(ReconcileOptions {
        overwrite,
        keep_tables,
        target_version: test.target_version.unwrap_or(BASE_SCHEMA_VERSION),
        ..ReconcileOptions::default()
    })
}

fn verify_report(
    dialect: &dyn Dialect,
    adapter: &dyn DatabaseAdapter,
    test: &TestCase,
    report: &RunReport,
) -> Result<(), String> {
    if report.errors.len() != test.failures {
        let errors = report
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        return Err(format!(
            "expected {} failure(s), got {}: {errors:?}",
            test.failures,
            report.errors.len()
        ));
    }

    expect_set("created", test.created.as_ref(), &report.created)?;
    expect_set("dropped", test.dropped.as_ref(), &report.dropped)?;
    expect_set("emptied", test.emptied.as_ref(), &report.emptied)?;
    expect_set("pruned", test.pruned.as_ref(), &report.pruned)?;

    if let Some(expected) = &test.tables {
        expect_set("tables", Some(expected), &user_tables(dialect, adapter)?)?;
    }

    for (table, expected) in &test.rows {
        let sql = format!(
            "SELECT COUNT(*) FROM {}",
            quote_identifier(table, dialect.identifier_quoting())
        );
        let actual = adapter
            .query_integer(&sql)
            .map_err(|error| format!("row count for `{table}` failed: {error}"))?
            .unwrap_or_default();
        if actual != *expected {
            return Err(format!("expected {expected} row(s) in `{table}`, got {actual}"));
        }
    }

    Ok(())
}

fn verify_no_changes(report: &RunReport) -> Result<(), String> {
    if !report.is_clean() {
        return Err(format!("second run reported {} failure(s)", report.errors.len()));
    }
    for (label, tables) in [
        ("created", &report.created),
        ("dropped", &report.dropped),
        ("pruned", &report.pruned),
    ] {
        if !tables.is_empty() {
            return Err(format!("second run {label} {}", join(tables)));
        }
    }
    Ok(())
}

fn expect_set(label: &str, expected: Option<&Vec<String>>, actual: &TableSet) -> Result<(), String> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let expected = table_set(expected);
    if expected == *actual {
        return Ok(());
    }
    Err(format!(
        "{label}: expected [{}], got [{}]",
        join(&expected),
        join(actual)
    ))
}

fn user_tables(dialect: &dyn Dialect, adapter: &dyn DatabaseAdapter) -> Result<TableSet, String> {
    let names = adapter
        .table_names()
        .map_err(|error| format!("table inventory failed: {error}"))?;
    Ok(names
        .into_iter()
        .map(TableName::new)
        .filter(|table| {
            !dialect
                .system_table_prefixes()
                .iter()
                .any(|prefix| table.has_prefix(prefix))
        })
        .collect())
}

fn join(tables: &TableSet) -> String {
    tables
        .iter()
        .map(TableName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
