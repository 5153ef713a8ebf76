use crate::{Result, Version};

/// A live connection to one database. Every statement autocommits.
pub trait DatabaseAdapter {
    /// Names of every base table in the connected schema, engine-internal
    /// tables included.
    fn table_names(&self) -> Result<Vec<String>>;
    fn execute(&self, sql: &str) -> Result<()>;
    /// First column of the first row as an integer; `None` for no rows or NULL.
    fn query_integer(&self, sql: &str) -> Result<Option<i64>>;
    fn server_version(&self) -> Result<Version>;
}
