mod adapter;
mod export_queries;

use reconql_core::{ConnectionConfig, DatabaseAdapter, Dialect, IdentifierQuoting, Result};

/// Scripts are written in MySQL syntax, so no rewriting is needed here.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
        adapter::connect(config)
    }

    fn identifier_quoting(&self) -> IdentifierQuoting {
        IdentifierQuoting::Backtick
    }
}

#[must_use]
pub fn table_names_query() -> &'static str {
    export_queries::TABLE_NAMES_QUERY
}
