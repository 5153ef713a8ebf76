pub(crate) const SHOW_SERVER_VERSION_QUERY: &str = "SHOW server_version";
pub(crate) const SHOW_SEARCH_PATH_QUERY: &str = "SHOW search_path";

// Ordinary and partitioned base tables of one schema. Partition children are
// managed through their parent and are left out.
pub(crate) const TABLE_NAMES_QUERY: &str = r#"
SELECT c.relname AS table_name
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND c.relispartition = false
ORDER BY c.relname ASC;
"#;
