pub(crate) const SHOW_SERVER_VERSION_QUERY: &str = "SELECT VERSION()";

pub(crate) const TABLE_NAMES_QUERY: &str = r#"
SELECT TABLE_NAME
FROM INFORMATION_SCHEMA.TABLES
WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
ORDER BY TABLE_NAME ASC;
"#;
