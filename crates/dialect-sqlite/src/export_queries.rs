// Deterministic ORDER BY clauses keep inventory output stable across runs.

pub(crate) const SHOW_SERVER_VERSION_QUERY: &str = "SELECT sqlite_version()";

// Engine-owned tables such as `sqlite_sequence` are listed too; the pruner
// filters them by prefix.
pub(crate) const TABLE_NAMES_QUERY: &str = r#"
SELECT name
FROM sqlite_master
WHERE type = 'table'
ORDER BY name ASC;
"#;
