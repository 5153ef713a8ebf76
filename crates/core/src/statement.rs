use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::{TableName, splitter::split_statements};

/// Placeholder rendered where a statement has no target table.
pub const NO_TABLE: &str = "<none>";

// Identifier: optional single pair of back-ticks or double quotes around a
// plain name, followed by `(`, whitespace, or the end of the statement.
static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?[`"]?([A-Za-z_][A-Za-z0-9_]*)[`"]?(?:\s|\(|$)"#,
    )
    .expect("create table pattern is valid")
});

static INSERT_INTO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^\s*INSERT\s+(?:OR\s+[A-Za-z]+\s+)?INTO\s+[`"]?([A-Za-z_][A-Za-z0-9_]*)[`"]?(?:\s|\(|$)"#,
    )
    .expect("insert pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Create,
    Insert,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    kind: StatementKind,
    target: Option<TableName>,
}

impl Statement {
    #[must_use]
    pub fn classify(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let (kind, target) = classify_sql(&sql);
        Self { sql, kind, target }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    #[must_use]
    pub const fn target(&self) -> Option<&TableName> {
        self.target.as_ref()
    }

    #[must_use]
    pub const fn is_create(&self) -> bool {
        matches!(self.kind, StatementKind::Create)
    }

    #[must_use]
    pub fn target_label(&self) -> &str {
        self.target.as_ref().map_or(NO_TABLE, TableName::as_str)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?} {}] {}", self.kind, self.target_label(), self.sql)
    }
}

fn classify_sql(sql: &str) -> (StatementKind, Option<TableName>) {
    if let Some(name) = capture_name(&CREATE_TABLE, sql) {
        return (StatementKind::Create, Some(name));
    }
    if let Some(name) = capture_name(&INSERT_INTO, sql) {
        return (StatementKind::Insert, Some(name));
    }
    (StatementKind::Other, None)
}

fn capture_name(pattern: &Regex, sql: &str) -> Option<TableName> {
    pattern
        .captures(sql)
        .and_then(|captures| captures.get(1))
        .map(|name| TableName::new(name.as_str()))
}

/// Splits and classifies a whole schema script, preserving script order.
#[must_use]
pub fn parse_script(script: &str) -> Vec<Statement> {
    split_statements(script)
        .into_iter()
        .map(Statement::classify)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{NO_TABLE, Statement, StatementKind, parse_script};

    fn kind_and_target(sql: &str) -> (StatementKind, Option<String>) {
        let statement = Statement::classify(sql);
        (
            statement.kind(),
            statement.target().map(|name| name.as_str().to_string()),
        )
    }

    #[test]
    fn recognizes_create_table_shapes() {
        assert_eq!(
            kind_and_target("  create table users (id INT)"),
            (StatementKind::Create, Some("users".to_string())),
        );
        assert_eq!(
            kind_and_target("CREATE TABLE IF NOT EXISTS `user_roles`(id INT)"),
            (StatementKind::Create, Some("user_roles".to_string())),
        );
        assert_eq!(
            kind_and_target("CREATE TABLE \"Model2\" (id INT)"),
            (StatementKind::Create, Some("Model2".to_string())),
        );
    }

    #[test]
    fn recognizes_insert_targets() {
        assert_eq!(
            kind_and_target("INSERT INTO schema_version (version) VALUES (19)"),
            (StatementKind::Insert, Some("schema_version".to_string())),
        );
        assert_eq!(
            kind_and_target("insert or ignore into settings VALUES ('a', 'b')"),
            (StatementKind::Insert, Some("settings".to_string())),
        );
    }

    #[test]
    fn unrecognized_shapes_fall_back_to_other() {
        for sql in [
            "CREATE TABLE app.users (id INT)",
            "CREATE INDEX idx_users ON users (id)",
            "UPDATE users SET name = 'x'",
            "CREATE TABLE",
        ] {
            let statement = Statement::classify(sql);
            assert_eq!(statement.kind(), StatementKind::Other, "{sql}");
            assert_eq!(statement.target_label(), NO_TABLE);
        }
    }

    #[test]
    fn parse_script_keeps_script_order() {
        let statements = parse_script(
            "CREATE TABLE a (id INT);\nCREATE TABLE b (id INT);\nINSERT INTO a VALUES (1);",
        );

        let targets = statements
            .iter()
            .map(Statement::target_label)
            .collect::<Vec<_>>();
        assert_eq!(targets, vec!["a", "b", "a"]);
        assert!(statements[0].is_create());
        assert_eq!(statements[2].kind(), StatementKind::Insert);
    }
}
