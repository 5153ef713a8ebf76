use std::{
    error::Error as StdError,
    io,
    sync::{Mutex, MutexGuard},
};

use reconql_core::{
    ConnectError, ConnectionConfig, DatabaseAdapter, ExecutionError, Result, Version,
};
use rusqlite::{Connection, OptionalExtension};

use crate::export_queries;

const DIALECT_NAME: &str = "sqlite";
const POISONED_CONNECTION_MESSAGE: &str = "sqlite connection state was poisoned";

pub(crate) struct SqliteAdapter {
    connection: Mutex<Connection>,
}

pub(crate) fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
    let connection = Connection::open(config.database.as_str())
        .map_err(|source| ConnectError::new(DIALECT_NAME, config.database.as_str(), source))?;

    Ok(Box::new(SqliteAdapter {
        connection: Mutex::new(connection),
    }))
}

impl SqliteAdapter {
    fn lock_connection(&self, sql: &str) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| execution_error(sql, io::Error::other(POISONED_CONNECTION_MESSAGE)))
    }
}

impl DatabaseAdapter for SqliteAdapter {
    fn table_names(&self) -> Result<Vec<String>> {
        let connection = self.lock_connection(export_queries::TABLE_NAMES_QUERY)?;
        query_string_rows(&connection, export_queries::TABLE_NAMES_QUERY)
    }

    fn execute(&self, sql: &str) -> Result<()> {
        let connection = self.lock_connection(sql)?;
        connection
            .execute_batch(sql)
            .map_err(|source| execution_error(sql, source))
    }

    fn query_integer(&self, sql: &str) -> Result<Option<i64>> {
        let connection = self.lock_connection(sql)?;
        connection
            .query_row(sql, [], |row| row.get::<_, Option<i64>>(0))
            .optional()
            .map(Option::flatten)
            .map_err(|source| execution_error(sql, source))
    }

    fn server_version(&self) -> Result<Version> {
        let connection = self.lock_connection(export_queries::SHOW_SERVER_VERSION_QUERY)?;
        let raw_version = query_server_version(&connection)?;
        parse_server_version(&raw_version)
            .ok_or_else(|| invalid_server_version_error(&raw_version))
    }
}

pub(crate) fn parse_server_version(raw: &str) -> Option<Version> {
    let mut parts = raw.split_whitespace().next()?.split('.');
    let major = parse_version_component(parts.next()?)?;
    let minor = parts.next().and_then(parse_version_component).unwrap_or(0);
    let patch = parts.next().and_then(parse_version_component).unwrap_or(0);

    Some(Version {
        major,
        minor,
        patch,
    })
}

fn query_server_version(connection: &Connection) -> Result<String> {
    connection
        .query_row(export_queries::SHOW_SERVER_VERSION_QUERY, [], |row| {
            row.get(0)
        })
        .map_err(|source| execution_error(export_queries::SHOW_SERVER_VERSION_QUERY, source))
}

fn query_string_rows(connection: &Connection, query: &str) -> Result<Vec<String>> {
    let mut statement = connection
        .prepare(query)
        .map_err(|source| execution_error(query, source))?;
    let mut rows = statement
        .query([])
        .map_err(|source| execution_error(query, source))?;

    let mut values = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|source| execution_error(query, source))?
    {
        values.push(
            row.get::<_, String>(0)
                .map_err(|source| execution_error(query, source))?,
        );
    }

    Ok(values)
}

fn parse_version_component(raw: &str) -> Option<u16> {
    let digits = raw
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect::<String>();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u16>().ok()
}

fn invalid_server_version_error(raw_version: &str) -> reconql_core::Error {
    execution_error(
        export_queries::SHOW_SERVER_VERSION_QUERY,
        io::Error::other(format!(
            "failed to parse sqlite server version string: `{raw_version}`"
        )),
    )
}

fn execution_error<E>(sql: &str, source: E) -> reconql_core::Error
where
    E: StdError + Send + Sync + 'static,
{
    ExecutionError::statement_failed(sql, source).into()
}
