mod adapter;
mod export_queries;

use reconql_core::{ConnectionConfig, DatabaseAdapter, Dialect, IdentifierQuoting, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
        adapter::connect(config)
    }

    fn identifier_quoting(&self) -> IdentifierQuoting {
        IdentifierQuoting::Ansi
    }

    fn system_table_prefixes(&self) -> &'static [&'static str] {
        &["sqlite_"]
    }
}

#[must_use]
pub fn table_names_query() -> &'static str {
    export_queries::TABLE_NAMES_QUERY
}
