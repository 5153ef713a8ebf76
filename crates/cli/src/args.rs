use std::{collections::BTreeMap, path::PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use reconql_core::{ConnectionConfig, Dialect};

/// Reconcile a live database schema with a SQL script.
#[derive(Debug, Parser)]
#[command(name = "reconql", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: DialectCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum DialectCommand {
    #[cfg(feature = "mysql")]
    /// Reconcile a MySQL database.
    Mysql(NetworkArgs),
    #[cfg(feature = "postgres")]
    /// Reconcile a PostgreSQL database.
    Postgres(NetworkArgs),
    #[cfg(feature = "sqlite")]
    /// Reconcile a SQLite database file.
    Sqlite(SqliteArgs),
}

#[derive(Debug, Args)]
pub(crate) struct NetworkArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long, env = "RECONQL_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Unix socket path; takes precedence over --host.
    #[arg(long)]
    socket: Option<String>,
    database: String,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Debug, Args)]
pub(crate) struct SqliteArgs {
    /// Database file; created when missing.
    database: String,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct RunArgs {
    /// SQL script to reconcile against. Read from stdin when omitted.
    #[arg(long, short = 'f', value_name = "PATH")]
    pub(crate) file: Option<PathBuf>,
    /// What happens to existing tables the script creates: none, drop, or empty.
    #[arg(long, value_name = "POLICY")]
    pub(crate) overwrite: Option<String>,
    /// Table left untouched by the run. Repeatable.
    #[arg(long = "keep-table", value_name = "TABLE")]
    pub(crate) keep_tables: Vec<String>,
    #[arg(long, value_name = "VERSION")]
    pub(crate) target_version: Option<u32>,
    /// Name recorded in the ledger.
    #[arg(long)]
    pub(crate) actor: Option<String>,
    /// Directory of `<version>.sql` upgrade scripts.
    #[arg(long, value_name = "DIR")]
    pub(crate) upgrades_dir: Option<PathBuf>,
    /// Print the planned statements without changing the database.
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// YAML file with defaults for the flags above.
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    pub(crate) verbose: u8,
}

impl DialectCommand {
    pub(crate) fn into_parts(self) -> (Box<dyn Dialect>, ConnectionConfig, RunArgs) {
        match self {
            #[cfg(feature = "mysql")]
            Self::Mysql(args) => {
                let dialect: Box<dyn Dialect> = Box::new(reconql_dialect_mysql::MysqlDialect);
                let (connection, run) = args.into_parts();
                (dialect, connection, run)
            }
            #[cfg(feature = "postgres")]
            Self::Postgres(args) => {
                let dialect: Box<dyn Dialect> = Box::new(reconql_dialect_postgres::PostgresDialect);
                let (connection, run) = args.into_parts();
                (dialect, connection, run)
            }
            #[cfg(feature = "sqlite")]
            Self::Sqlite(args) => {
                let dialect: Box<dyn Dialect> = Box::new(reconql_dialect_sqlite::SqliteDialect);
                (dialect, ConnectionConfig::for_database(args.database), args.run)
            }
        }
    }
}

impl NetworkArgs {
    #[cfg_attr(not(any(feature = "mysql", feature = "postgres")), allow(dead_code))]
    fn into_parts(self) -> (ConnectionConfig, RunArgs) {
        let connection = ConnectionConfig {
            host: self.host,
            port: self.port,
            user: self.user,
            password: self.password,
            database: self.database,
            socket: self.socket,
            extra: BTreeMap::new(),
        };
        (connection, self.run)
    }
}
