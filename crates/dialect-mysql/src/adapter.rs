use std::{
    error::Error as StdError,
    io,
    sync::{Mutex, MutexGuard},
};

use mysql::{OptsBuilder, Pool, PooledConn, prelude::Queryable};
use reconql_core::{
    ConnectError, ConnectionConfig, DatabaseAdapter, ExecutionError, Result, Version,
};

use crate::export_queries;

const DIALECT_NAME: &str = "mysql";
const DEFAULT_MYSQL_HOST: &str = "127.0.0.1";
const DEFAULT_MYSQL_PORT: u16 = 3306;
const POISONED_CONNECTION_MESSAGE: &str = "mysql connection state was poisoned";

pub(crate) struct MysqlAdapter {
    connection: Mutex<PooledConn>,
}

pub(crate) fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
    let connection = connect_connection(config)?;

    Ok(Box::new(MysqlAdapter {
        connection: Mutex::new(connection),
    }))
}

impl MysqlAdapter {
    fn lock_connection(&self, sql: &str) -> Result<MutexGuard<'_, PooledConn>> {
        self.connection
            .lock()
            .map_err(|_| execution_error(sql, io::Error::other(POISONED_CONNECTION_MESSAGE)))
    }
}

impl DatabaseAdapter for MysqlAdapter {
    fn table_names(&self) -> Result<Vec<String>> {
        let query = export_queries::TABLE_NAMES_QUERY;
        let mut connection = self.lock_connection(query)?;
        connection
            .query::<String, _>(query)
            .map_err(|source| execution_error(query, source))
    }

    fn execute(&self, sql: &str) -> Result<()> {
        let mut connection = self.lock_connection(sql)?;
        connection
            .query_drop(sql)
            .map_err(|source| execution_error(sql, source))
    }

    fn query_integer(&self, sql: &str) -> Result<Option<i64>> {
        let mut connection = self.lock_connection(sql)?;
        connection
            .query_first::<Option<i64>, _>(sql)
            .map(Option::flatten)
            .map_err(|source| execution_error(sql, source))
    }

    fn server_version(&self) -> Result<Version> {
        let mut connection = self.lock_connection(export_queries::SHOW_SERVER_VERSION_QUERY)?;
        let raw_version =
            query_scalar(&mut connection, export_queries::SHOW_SERVER_VERSION_QUERY)?;
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

fn connect_connection(config: &ConnectionConfig) -> Result<PooledConn> {
    let mut builder = OptsBuilder::new()
        .ip_or_hostname(config.host.clone().or(Some(DEFAULT_MYSQL_HOST.to_string())))
        .tcp_port(config.port.unwrap_or(DEFAULT_MYSQL_PORT))
        .user(config.user.clone())
        .pass(config.password.clone())
        .db_name(Some(config.database.clone()));
    if let Some(socket) = &config.socket {
        builder = builder.socket(Some(socket.clone()));
    }

    let target = connection_target(config);
    let pool = Pool::new(builder)
        .map_err(|source| ConnectError::new(DIALECT_NAME, target.as_str(), source))?;
    pool.get_conn()
        .map_err(|source| ConnectError::new(DIALECT_NAME, target, source).into())
}

fn connection_target(config: &ConnectionConfig) -> String {
    let host = config
        .socket
        .as_deref()
        .or(config.host.as_deref())
        .unwrap_or(DEFAULT_MYSQL_HOST);
    format!(
        "{host}:{}/{}",
        config.port.unwrap_or(DEFAULT_MYSQL_PORT),
        config.database
    )
}

fn query_scalar(connection: &mut PooledConn, sql: &str) -> Result<String> {
    connection
        .query_first::<String, _>(sql)
        .map_err(|source| execution_error(sql, source))?
        .ok_or_else(|| execution_error(sql, io::Error::other("query returned no rows")))
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
            "failed to parse mysql server version string: `{raw_version}`"
        )),
    )
}

fn execution_error<E>(sql: &str, source: E) -> reconql_core::Error
where
    E: StdError + Send + Sync + 'static,
{
    ExecutionError::statement_failed(sql, source).into()
}

#[cfg(test)]
mod tests {
    use super::parse_server_version;

    #[test]
    fn vendor_suffix_is_ignored() {
        let version = parse_server_version("8.0.36-0ubuntu0.22.04.1").expect("parseable version");

        assert_eq!((version.major, version.minor, version.patch), (8, 0, 36));
    }
}
