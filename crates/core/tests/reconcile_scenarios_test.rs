use reconql_core::{
    ExecutionError, IdentifierQuoting, KeepTables, Orchestrator, OverwritePolicy, Phase,
    ReconcileOptions, TableName, TableSet, table_set,
};

#[path = "support/fake_adapter.rs"]
mod fake_adapter;
#[path = "support/fake_dialect.rs"]
mod fake_dialect;

use fake_adapter::FakeAdapter;
use fake_dialect::FakeDialect;

const BASE_SCRIPT: &str = "
-- base schema
CREATE TABLE metadata_ledger (sequence_id INT, modified_at TEXT, actor TEXT, affected_tables TEXT, affected_columns TEXT, remarks TEXT);
CREATE TABLE schema_version (version INT);
INSERT INTO schema_version (version) VALUES (19);
CREATE TABLE a (id INT);
CREATE TABLE b (id INT);
";

fn options(overwrite: OverwritePolicy, keep_tables: KeepTables) -> ReconcileOptions {
    ReconcileOptions {
        overwrite,
        keep_tables,
        ..ReconcileOptions::default()
    }
}

fn names(tables: &TableSet) -> Vec<String> {
    tables.iter().map(|table| table.as_str().to_string()).collect()
}

#[test]
fn default_policy_preserves_existing_tables_and_creates_missing_ones() {
    let dialect = FakeDialect::default();
    let adapter =
        FakeAdapter::with_tables(&[("a", 2), ("metadata_ledger", 0), ("schema_version", 1)]);

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            BASE_SCRIPT,
            &options(OverwritePolicy::None, KeepTables::Existing),
        )
        .expect("run should reach closed");

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(names(&report.created), vec!["b"]);
    assert!(report.preserved.contains(&TableName::new("a")));
    assert_eq!(adapter.rows("a"), Some(2));
    assert_eq!(adapter.rows("schema_version"), Some(1), "kept table must not be re-seeded");
    assert_eq!(adapter.rows("metadata_ledger"), Some(1));
    assert_eq!(report.ledger.as_ref().map(|record| record.sequence_id), Some(1));
    assert_eq!(
        report.phases,
        vec![
            Phase::Connected,
            Phase::Inventoried,
            Phase::Reconciled,
            Phase::Pruned,
            Phase::Ledgered,
            Phase::Closed,
        ],
    );
}

#[test]
fn drop_policy_recreates_existing_and_prunes_strays() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::with_tables(&[("a", 5), ("c", 1)]);

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            BASE_SCRIPT,
            &options(OverwritePolicy::Drop, KeepTables::Existing),
        )
        .expect("run should reach closed");

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(names(&report.dropped), vec!["a"]);
    assert!(report.created.contains(&TableName::new("a")));
    assert!(report.created.contains(&TableName::new("b")));
    assert_eq!(names(&report.pruned), vec!["c"]);
    assert_eq!(adapter.rows("a"), Some(0));
    assert_eq!(
        adapter.table_list(),
        vec!["a", "b", "metadata_ledger", "schema_version"],
    );

    let executed = adapter.executed_sql();
    let drop_index = executed
        .iter()
        .position(|sql| sql == "DROP TABLE \"a\"")
        .expect("a must be dropped");
    let create_index = executed
        .iter()
        .position(|sql| sql == "CREATE TABLE a (id INT)")
        .expect("a must be recreated");
    assert!(drop_index < create_index);
}

#[test]
fn empty_policy_clears_rows_without_recreating_and_keeps_ledger() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::with_tables(&[
        ("a", 3),
        ("metadata_ledger", 1),
        ("schema_version", 1),
    ]);
    adapter.set_integer("SELECT MAX(sequence_id) FROM metadata_ledger", 1);

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            BASE_SCRIPT,
            &options(OverwritePolicy::Empty, KeepTables::Existing),
        )
        .expect("run should reach closed");

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(adapter.rows("a"), Some(0));
    assert!(adapter.executed_sql().contains(&"DELETE FROM \"a\"".to_string()));
    assert!(!adapter.executed_sql().contains(&"CREATE TABLE a (id INT)".to_string()));
    assert_eq!(names(&report.emptied), vec!["a", "schema_version"]);
    assert_eq!(adapter.rows("schema_version"), Some(1), "version row is re-seeded");
    assert_eq!(adapter.rows("metadata_ledger"), Some(2), "ledger keeps history");
    assert!(report.pruned.is_empty());
    assert!(report.preserved.is_empty(), "empty policy keeps silently");
    assert_eq!(report.ledger.as_ref().map(|record| record.sequence_id), Some(2));
}

#[test]
fn second_run_with_same_parameters_changes_nothing() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::default();
    let orchestrator = Orchestrator::new(&dialect);
    let options = options(OverwritePolicy::None, KeepTables::Existing);

    orchestrator
        .run_with_adapter(&adapter, BASE_SCRIPT, &options)
        .expect("first run");
    let tables_after_first = adapter.table_list();
    let executed_after_first = adapter.executed_sql().len();

    let second = orchestrator
        .run_with_adapter(&adapter, BASE_SCRIPT, &options)
        .expect("second run");

    assert!(second.is_clean(), "unexpected errors: {:?}", second.errors);
    assert!(second.created.is_empty());
    assert!(second.pruned.is_empty());
    assert_eq!(adapter.table_list(), tables_after_first);
    let second_run_sql = &adapter.executed_sql()[executed_after_first..];
    assert_eq!(second_run_sql.len(), 1, "only the ledger row: {second_run_sql:?}");
    assert!(second_run_sql[0].starts_with("INSERT INTO metadata_ledger"));
}

#[test]
fn explicit_keep_list_protects_tables_under_drop() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::with_tables(&[("a", 4), ("c", 2)]);
    let keep = KeepTables::listed(["a", "c"]).expect("valid keep list");

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            &format!("{BASE_SCRIPT}INSERT INTO a VALUES (9);"),
            &options(OverwritePolicy::Drop, keep),
        )
        .expect("run should reach closed");

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(adapter.rows("a"), Some(4));
    assert_eq!(adapter.rows("c"), Some(2));
    assert!(report.dropped.is_empty());
    assert_eq!(report.skipped_statements, 1);
    assert_eq!(report.keep, table_set(["a", "c"]));
}

#[test]
fn failures_accumulate_and_block_later_statements_on_the_same_table() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::default();
    adapter.set_fail_on_sql("CREATE TABLE b (id INT)");

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            &format!("{BASE_SCRIPT}INSERT INTO b VALUES (1);CREATE TABLE d (id INT);"),
            &options(OverwritePolicy::None, KeepTables::Existing),
        )
        .expect("statement failures are not fatal");

    assert_eq!(report.errors.len(), 2, "errors: {:?}", report.errors);
    assert!(matches!(
        &report.errors[0],
        ExecutionError::StatementFailed { table: Some(table), sql, .. }
            if table == "b" && sql == "CREATE TABLE b (id INT)"
    ));
    assert!(matches!(
        &report.errors[1],
        ExecutionError::Blocked { table, .. } if table == "b"
    ));
    assert!(report.created.contains(&TableName::new("d")), "later tables still created");
    assert!(report.phases.contains(&Phase::Closed));
}

#[test]
fn failed_drop_does_not_attempt_the_create() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::with_tables(&[("a", 1)]);
    adapter.set_fail_on_sql("DROP TABLE \"a\"");

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            BASE_SCRIPT,
            &options(OverwritePolicy::Drop, KeepTables::Existing),
        )
        .expect("statement failures are not fatal");

    assert!(!adapter.executed_sql().contains(&"CREATE TABLE a (id INT)".to_string()));
    assert_eq!(report.errors.len(), 1, "reported once: {:?}", report.errors);
    assert_eq!(report.errors[0].table(), Some("a"));
    assert!(!report.created.contains(&TableName::new("a")));
    assert!(report.pruned.is_empty());
    assert_eq!(adapter.rows("a"), Some(1));
}

#[test]
fn failed_delete_keeps_the_table_out_of_pruning() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::with_tables(&[("a", 3), ("stray", 1)]);
    adapter.set_fail_on_sql("DELETE FROM \"a\"");

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            BASE_SCRIPT,
            &options(OverwritePolicy::Empty, KeepTables::Existing),
        )
        .expect("statement failures are not fatal");

    assert_eq!(report.errors.len(), 1, "errors: {:?}", report.errors);
    assert!(report.emptied.is_empty());
    assert_eq!(names(&report.pruned), vec!["stray"]);
    assert_eq!(adapter.rows("a"), Some(3), "structure and rows survive");
}

const RESERVED_WORD_SCRIPT: &str = "
CREATE TABLE metadata_ledger (sequence_id INT, modified_at TEXT, actor TEXT, affected_tables TEXT, affected_columns TEXT, remarks TEXT);
CREATE TABLE schema_version (version INT);
CREATE TABLE \"order\" (id INT);
";

#[test]
fn generated_statements_quote_the_live_table_name() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::with_tables(&[("Order", 2), ("group", 1)]);

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            RESERVED_WORD_SCRIPT,
            &options(OverwritePolicy::Drop, KeepTables::Existing),
        )
        .expect("run should reach closed");

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    let executed = adapter.executed_sql();
    assert!(executed.contains(&"DROP TABLE \"Order\"".to_string()), "{executed:?}");
    assert!(executed.contains(&"DROP TABLE \"group\"".to_string()), "{executed:?}");
    assert_eq!(names(&report.pruned), vec!["group"]);
    assert_eq!(adapter.rows("order"), Some(0));
}

#[test]
fn backtick_dialects_quote_generated_statements_with_backticks() {
    let mut dialect = FakeDialect::default();
    dialect.quoting = IdentifierQuoting::Backtick;
    let adapter = FakeAdapter::with_tables(&[("order", 2), ("group", 1)]);

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            RESERVED_WORD_SCRIPT,
            &options(OverwritePolicy::Empty, KeepTables::Existing),
        )
        .expect("run should reach closed");

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    let executed = adapter.executed_sql();
    assert!(executed.contains(&"DELETE FROM `order`".to_string()), "{executed:?}");
    assert!(executed.contains(&"DROP TABLE `group`".to_string()), "{executed:?}");
    assert_eq!(names(&report.emptied), vec!["order"]);
    assert_eq!(adapter.rows("order"), Some(0));
}

#[test]
fn statements_are_rewritten_for_the_dialect_before_execution() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::default();

    Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            "CREATE TABLE `events` (`at` DATETIME);",
            &options(OverwritePolicy::None, KeepTables::Existing),
        )
        .expect("run should reach closed");

    assert_eq!(
        adapter.executed_sql().first().map(String::as_str),
        Some("CREATE TABLE \"events\" (\"at\" TIMESTAMP)"),
    );
}

#[test]
fn unreadable_prior_version_is_reported_and_the_run_continues() {
    let dialect = FakeDialect::default();
    let adapter = FakeAdapter::with_tables(&[("schema_version", 1)]);
    adapter.set_fail_on_sql("SELECT MAX(version) FROM schema_version");

    let report = Orchestrator::new(&dialect)
        .run_with_adapter(
            &adapter,
            BASE_SCRIPT,
            &options(OverwritePolicy::None, KeepTables::Existing),
        )
        .expect("an unreadable version is not fatal");

    assert_eq!(report.prior_version, None);
    assert_eq!(report.errors[0].table(), Some("schema_version"));
    assert!(report.created.contains(&TableName::new("a")));
    assert!(report.phases.contains(&Phase::Inventoried));
    assert_eq!(report.phases.last(), Some(&Phase::Closed));
}
