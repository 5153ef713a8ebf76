use std::error::Error as StdError;

use thiserror::Error;

use crate::statement::NO_TABLE;

pub type BoxError = Box<dyn StdError + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Execute(#[from] ExecutionError),
}

/// Rejected invocation parameters. Raised before any database contact.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target version {requested} is below the minimum supported base version {minimum}")]
    TargetVersionBelowBase { requested: u32, minimum: u32 },
    #[error("unknown overwrite policy `{0}`; expected one of none, drop, empty")]
    UnknownPolicy(String),
    #[error("invalid table name `{0}`")]
    InvalidTableName(String),
    #[error("cannot read upgrade script for version {version}: `{path}`")]
    UpgradeScript {
        version: u32,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
#[error("failed to connect to {dialect} database `{target}`")]
pub struct ConnectError {
    pub dialect: String,
    pub target: String,
    #[source]
    pub source: BoxError,
}

impl ConnectError {
    pub fn new<E>(dialect: impl Into<String>, target: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            dialect: dialect.into(),
            target: target.into(),
            source: Box::new(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("statement on table `{}` failed: {sql}", table.as_deref().unwrap_or(NO_TABLE))]
    StatementFailed {
        table: Option<String>,
        sql: String,
        #[source]
        source: BoxError,
    },
    #[error("statement on table `{table}` not attempted after an earlier failure on that table: {sql}")]
    Blocked { table: String, sql: String },
    #[error("version upgrade to {target_version} failed")]
    UpgradeFailed {
        target_version: u32,
        #[source]
        source: BoxError,
    },
}

impl ExecutionError {
    pub fn statement_failed<E>(sql: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::StatementFailed {
            table: None,
            sql: sql.into(),
            source: Box::new(source),
        }
    }

    /// Tags an adapter failure with the table the statement targeted.
    pub(crate) fn from_adapter(error: Error, table: Option<&str>, sql: &str) -> Self {
        let table = table.map(str::to_string);
        match error {
            Error::Execute(Self::StatementFailed { source, .. }) => Self::StatementFailed {
                table,
                sql: sql.to_string(),
                source,
            },
            other => Self::StatementFailed {
                table,
                sql: sql.to_string(),
                source: Box::new(other),
            },
        }
    }

    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::StatementFailed { table, .. } => table.as_deref(),
            Self::Blocked { table, .. } => Some(table),
            Self::UpgradeFailed { .. } => None,
        }
    }
}
