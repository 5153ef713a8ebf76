use std::{
    error::Error as StdError,
    io,
    sync::{Mutex, MutexGuard},
};

use postgres::{Client, NoTls, Row, types::Type};
use reconql_core::{
    ConnectError, ConnectionConfig, DatabaseAdapter, ExecutionError, Result, Version,
};

use crate::export_queries;

const DIALECT_NAME: &str = "postgres";
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_SCHEMA: &str = "public";
const SEARCH_PATH_OVERRIDE_KEY: &str = "postgres.search_path";
const POISONED_CLIENT_MESSAGE: &str = "postgres connection state was poisoned";

pub(crate) struct PostgresAdapter {
    client: Mutex<Client>,
    /// Schema whose tables make up the inventory: the first explicit search
    /// path entry.
    schema: String,
}

pub(crate) fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
    let mut client = connect_client(config)?;
    let search_path_raw = if let Some(raw_search_path) = config.extra.get(SEARCH_PATH_OVERRIDE_KEY)
    {
        raw_search_path.clone()
    } else {
        query_scalar(&mut client, export_queries::SHOW_SEARCH_PATH_QUERY)?
    };
    let schema = parse_search_path(&search_path_raw)
        .into_iter()
        .next()
        .unwrap_or_else(|| DEFAULT_POSTGRES_SCHEMA.to_string());

    Ok(Box::new(PostgresAdapter {
        client: Mutex::new(client),
        schema,
    }))
}

impl PostgresAdapter {
    fn lock_client(&self, sql: &str) -> Result<MutexGuard<'_, Client>> {
        self.client
            .lock()
            .map_err(|_| execution_error(sql, io::Error::other(POISONED_CLIENT_MESSAGE)))
    }
}

impl DatabaseAdapter for PostgresAdapter {
    fn table_names(&self) -> Result<Vec<String>> {
        let mut client = self.lock_client(export_queries::TABLE_NAMES_QUERY)?;
        let rows = client
            .query(export_queries::TABLE_NAMES_QUERY, &[&self.schema])
            .map_err(|source| execution_error(export_queries::TABLE_NAMES_QUERY, source))?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, String>("table_name")
                    .map_err(|source| execution_error(export_queries::TABLE_NAMES_QUERY, source))
            })
            .collect()
    }

    fn execute(&self, sql: &str) -> Result<()> {
        let mut client = self.lock_client(sql)?;
        client
            .batch_execute(sql)
            .map_err(|source| execution_error(sql, source))
    }

    fn query_integer(&self, sql: &str) -> Result<Option<i64>> {
        let mut client = self.lock_client(sql)?;
        let row = client
            .query_opt(sql, &[])
            .map_err(|source| execution_error(sql, source))?;
        match row {
            Some(row) => integer_value(&row, sql),
            None => Ok(None),
        }
    }

    fn server_version(&self) -> Result<Version> {
        let mut client = self.lock_client(export_queries::SHOW_SERVER_VERSION_QUERY)?;
        let raw_version = query_scalar(&mut client, export_queries::SHOW_SERVER_VERSION_QUERY)?;
        parse_server_version(&raw_version)
            .ok_or_else(|| invalid_server_version_error(&raw_version))
    }
}

pub fn parse_search_path(raw: &str) -> Vec<String> {
    split_search_path(raw)
        .into_iter()
        .filter_map(|entry| normalize_search_path_entry(entry.as_str()))
        .collect()
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

fn connect_client(config: &ConnectionConfig) -> Result<Client> {
    let mut postgres_config = postgres::Config::new();

    if let Some(socket_path) = &config.socket {
        postgres_config.host_path(socket_path);
    } else if let Some(host) = &config.host {
        postgres_config.host(host);
    } else {
        postgres_config.host(DEFAULT_POSTGRES_HOST);
    }

    if let Some(port) = config.port {
        postgres_config.port(port);
    }
    if let Some(user) = &config.user {
        postgres_config.user(user);
    }
    if let Some(password) = &config.password {
        postgres_config.password(password);
    }
    postgres_config.dbname(&config.database);

    postgres_config
        .connect(NoTls)
        .map_err(|source| ConnectError::new(DIALECT_NAME, connection_target(config), source).into())
}

fn connection_target(config: &ConnectionConfig) -> String {
    let host = config
        .socket
        .as_deref()
        .or(config.host.as_deref())
        .unwrap_or(DEFAULT_POSTGRES_HOST);
    match config.port {
        Some(port) => format!("{host}:{port}/{}", config.database),
        None => format!("{host}/{}", config.database),
    }
}

fn query_scalar(client: &mut Client, sql: &str) -> Result<String> {
    let row = client
        .query_one(sql, &[])
        .map_err(|source| execution_error(sql, source))?;
    row.try_get::<_, String>(0)
        .map_err(|source| execution_error(sql, source))
}

// `MAX` keeps the column's own width, so every integer width is accepted.
fn integer_value(row: &Row, sql: &str) -> Result<Option<i64>> {
    let Some(column) = row.columns().first() else {
        return Ok(None);
    };
    let column_type = column.type_();
    let value = if *column_type == Type::INT2 {
        row.try_get::<_, Option<i16>>(0)
            .map(|value| value.map(i64::from))
    } else if *column_type == Type::INT4 {
        row.try_get::<_, Option<i32>>(0)
            .map(|value| value.map(i64::from))
    } else {
        row.try_get::<_, Option<i64>>(0)
    };
    value.map_err(|source| execution_error(sql, source))
}

fn normalize_search_path_entry(entry: &str) -> Option<String> {
    let trimmed = entry.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = unquote_search_path_entry(trimmed);
    if is_implicit_schema(normalized.as_str()) {
        return None;
    }
    Some(normalized)
}

fn split_search_path(raw: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                current.push(ch);
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    let _ = chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                entries.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        entries.push(current.trim().to_string());
    }
    entries
}

fn unquote_search_path_entry(entry: &str) -> String {
    if entry.len() >= 2 && entry.starts_with('"') && entry.ends_with('"') {
        return entry[1..entry.len() - 1].replace("\"\"", "\"");
    }
    entry.to_string()
}

fn is_implicit_schema(schema: &str) -> bool {
    let normalized = schema.trim();
    normalized.eq_ignore_ascii_case("$user")
        || normalized.eq_ignore_ascii_case("pg_catalog")
        || normalized.eq_ignore_ascii_case("pg_temp")
        || normalized.to_ascii_lowercase().starts_with("pg_temp_")
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
            "failed to parse postgres server version string: `{raw_version}`"
        )),
    )
}

fn execution_error<E>(sql: &str, source: E) -> reconql_core::Error
where
    E: StdError + Send + Sync + 'static,
{
    ExecutionError::statement_failed(sql, source).into()
}
