use std::{cell::RefCell, collections::BTreeMap, error::Error as StdError, fmt};

use reconql_core::{
    DatabaseAdapter, ExecutionError, Result, Statement, StatementKind, Version,
};

#[derive(Debug, Default)]
pub struct FakeAdapter {
    state: RefCell<FakeAdapterState>,
}

#[derive(Debug, Default)]
struct FakeAdapterState {
    // keyed by lowercase name: (spelling, row count)
    tables: BTreeMap<String, (String, usize)>,
    integers: BTreeMap<String, i64>,
    executed_sql: Vec<String>,
    fail_on_sql: Vec<String>,
    fail_table_names: bool,
}

#[allow(dead_code)]
impl FakeAdapter {
    pub fn with_tables(tables: &[(&str, usize)]) -> Self {
        let adapter = Self::default();
        for (name, rows) in tables {
            adapter.add_table(name, *rows);
        }
        adapter
    }

    pub fn add_table(&self, name: &str, rows: usize) {
        self.state
            .borrow_mut()
            .tables
            .insert(name.to_ascii_lowercase(), (name.to_string(), rows));
    }

    pub fn set_integer(&self, sql: impl Into<String>, value: i64) {
        self.state.borrow_mut().integers.insert(sql.into(), value);
    }

    pub fn set_fail_on_sql(&self, sql: impl Into<String>) {
        self.state.borrow_mut().fail_on_sql.push(sql.into());
    }

    pub fn set_fail_table_names(&self, fail: bool) {
        self.state.borrow_mut().fail_table_names = fail;
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.state.borrow().executed_sql.clone()
    }

    pub fn table_list(&self) -> Vec<String> {
        self.state.borrow().tables.keys().cloned().collect()
    }

    pub fn rows(&self, name: &str) -> Option<usize> {
        self.state
            .borrow()
            .tables
            .get(&name.to_ascii_lowercase())
            .map(|(_, rows)| *rows)
    }
}

impl DatabaseAdapter for FakeAdapter {
    fn table_names(&self) -> Result<Vec<String>> {
        let state = self.state.borrow();
        if state.fail_table_names {
            return Err(ExecutionError::statement_failed(
                "<table names>",
                FakeSourceError("inventory unavailable".to_string()),
            )
            .into());
        }
        Ok(state
            .tables
            .values()
            .map(|(spelling, _)| spelling.clone())
            .collect())
    }

    fn execute(&self, sql: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_on_sql.iter().any(|rule| rule == sql) {
            return Err(failure(sql, "injected failure"));
        }

        let statement = Statement::classify(sql);
        let upper = sql.to_ascii_uppercase();
        match (statement.kind(), statement.target()) {
            (StatementKind::Create, Some(table)) => {
                if state.tables.contains_key(table.key()) {
                    return Err(failure(sql, "table already exists"));
                }
                state
                    .tables
                    .insert(table.key().to_string(), (table.as_str().to_string(), 0));
            }
            (StatementKind::Insert, Some(table)) => {
                let Some(entry) = state.tables.get_mut(table.key()) else {
                    return Err(failure(sql, "no such table"));
                };
                entry.1 += 1;
            }
            _ => {
                if let Some(name) = upper.strip_prefix("DROP TABLE ") {
                    if state.tables.remove(&table_key(name)).is_none() {
                        return Err(failure(sql, "no such table"));
                    }
                } else if let Some(name) = upper.strip_prefix("DELETE FROM ") {
                    let Some(entry) = state.tables.get_mut(&table_key(name))
                    else {
                        return Err(failure(sql, "no such table"));
                    };
                    entry.1 = 0;
                }
            }
        }

        state.executed_sql.push(sql.to_string());
        Ok(())
    }

    fn query_integer(&self, sql: &str) -> Result<Option<i64>> {
        let state = self.state.borrow();
        if state.fail_on_sql.iter().any(|rule| rule == sql) {
            return Err(failure(sql, "injected failure"));
        }
        Ok(state.integers.get(sql).copied())
    }

    fn server_version(&self) -> Result<Version> {
        Ok(Version {
            major: 1,
            minor: 0,
            patch: 0,
        })
    }
}

fn table_key(identifier: &str) -> String {
    let trimmed = identifier.trim();
    let unquoted = ['"', '`']
        .into_iter()
        .find_map(|quote| {
            trimmed
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
                .map(|inner| inner.replace(&format!("{quote}{quote}"), &quote.to_string()))
        })
        .unwrap_or_else(|| trimmed.to_string());
    unquoted.to_ascii_lowercase()
}

fn failure(sql: &str, message: &str) -> reconql_core::Error {
    ExecutionError::statement_failed(sql, FakeSourceError(message.to_string())).into()
}

#[derive(Debug)]
struct FakeSourceError(String);

impl fmt::Display for FakeSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for FakeSourceError {}
