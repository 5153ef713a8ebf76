mod adapter;
mod export_queries;

use reconql_core::{
    ConnectionConfig, DatabaseAdapter, Dialect, IdentifierQuoting, Result, TypeRewrite,
};

pub use adapter::parse_search_path;

/// MySQL-flavoured type names accepted in scripts, mapped to PostgreSQL types.
const TYPE_REWRITES: &[TypeRewrite] = &[
    TypeRewrite {
        from: "DATETIME",
        to: "TIMESTAMP",
    },
    TypeRewrite {
        from: "TINYINT",
        to: "SMALLINT",
    },
    TypeRewrite {
        from: "TINYTEXT",
        to: "TEXT",
    },
    TypeRewrite {
        from: "MEDIUMTEXT",
        to: "TEXT",
    },
    TypeRewrite {
        from: "LONGTEXT",
        to: "TEXT",
    },
    TypeRewrite {
        from: "BLOB",
        to: "BYTEA",
    },
    TypeRewrite {
        from: "LONGBLOB",
        to: "BYTEA",
    },
];

const DROP_CAVEAT: &str = "DROP TABLE is issued without CASCADE, so tables still referenced by a foreign key cannot be dropped and will be reported as failures";

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
        adapter::connect(config)
    }

    fn identifier_quoting(&self) -> IdentifierQuoting {
        IdentifierQuoting::Ansi
    }

    fn type_rewrites(&self) -> &'static [TypeRewrite] {
        TYPE_REWRITES
    }

    fn system_table_prefixes(&self) -> &'static [&'static str] {
        &["pg_", "sql_"]
    }

    fn drop_caveat(&self) -> Option<&'static str> {
        Some(DROP_CAVEAT)
    }
}

#[must_use]
pub fn table_names_query() -> &'static str {
    export_queries::TABLE_NAMES_QUERY
}
