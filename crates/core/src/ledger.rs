use chrono::{NaiveDateTime, Utc};
use tracing::info;

use crate::{DatabaseAdapter, OverwritePolicy, Result, TableInventory, TableName, TableSet};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ALL_COLUMNS: &str = "*";
const NO_TABLES: &str = "-";

/// Names of the audit ledger and schema version tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTables {
    pub ledger_table: String,
    pub sequence_column: String,
    pub timestamp_column: String,
    pub actor_column: String,
    pub tables_column: String,
    pub columns_column: String,
    pub remarks_column: String,
    pub version_table: String,
    pub version_column: String,
}

impl Default for LedgerTables {
    fn default() -> Self {
        Self {
            ledger_table: "metadata_ledger".to_string(),
            sequence_column: "sequence_id".to_string(),
            timestamp_column: "modified_at".to_string(),
            actor_column: "actor".to_string(),
            tables_column: "affected_tables".to_string(),
            columns_column: "affected_columns".to_string(),
            remarks_column: "remarks".to_string(),
            version_table: "schema_version".to_string(),
            version_column: "version".to_string(),
        }
    }
}

impl LedgerTables {
    #[must_use]
    pub fn ledger_name(&self) -> TableName {
        TableName::new(&self.ledger_table)
    }

    #[must_use]
    pub fn version_name(&self) -> TableName {
        TableName::new(&self.version_table)
    }

    #[must_use]
    pub fn max_sequence_sql(&self) -> String {
        format!(
            "SELECT MAX({}) FROM {}",
            self.sequence_column, self.ledger_table
        )
    }

    #[must_use]
    pub fn latest_version_sql(&self) -> String {
        format!(
            "SELECT MAX({}) FROM {}",
            self.version_column, self.version_table
        )
    }

    #[must_use]
    pub fn record_version_sql(&self, version: u32) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({version})",
            self.version_table, self.version_column
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub sequence_id: i64,
    pub timestamp: NaiveDateTime,
    pub actor: String,
    pub affected_tables: String,
    pub affected_columns: String,
    pub remarks: String,
}

impl LedgerRecord {
    #[must_use]
    pub fn insert_sql(&self, tables: &LedgerTables) -> String {
        format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}) VALUES ({}, {}, {}, {}, {}, {})",
            tables.ledger_table,
            tables.sequence_column,
            tables.timestamp_column,
            tables.actor_column,
            tables.tables_column,
            tables.columns_column,
            tables.remarks_column,
            self.sequence_id,
            sql_literal(&self.timestamp.format(TIMESTAMP_FORMAT).to_string()),
            sql_literal(&self.actor),
            sql_literal(&self.affected_tables),
            sql_literal(&self.affected_columns),
            sql_literal(&self.remarks),
        )
    }
}

/// Reads the latest schema version, or `None` when the version table is
/// missing or empty.
pub fn read_schema_version(
    adapter: &dyn DatabaseAdapter,
    tables: &LedgerTables,
) -> Result<Option<i64>> {
    if !TableInventory::load(adapter)?.contains(&tables.version_name()) {
        return Ok(None);
    }
    adapter.query_integer(&tables.latest_version_sql())
}

pub struct LedgerWriter<'a> {
    adapter: &'a dyn DatabaseAdapter,
    tables: &'a LedgerTables,
}

impl<'a> LedgerWriter<'a> {
    #[must_use]
    pub fn new(adapter: &'a dyn DatabaseAdapter, tables: &'a LedgerTables) -> Self {
        Self { adapter, tables }
    }

    /// `MAX(sequence) + 1`, starting at 1 for an empty or missing ledger.
    pub fn next_sequence_id(&self) -> Result<i64> {
        if !TableInventory::load(self.adapter)?.contains(&self.tables.ledger_name()) {
            return Ok(1);
        }
        let current = self
            .adapter
            .query_integer(&self.tables.max_sequence_sql())?
            .unwrap_or(0);
        Ok(current + 1)
    }

    pub fn compose(
        &self,
        actor: &str,
        affected: &TableSet,
        overwrite: OverwritePolicy,
    ) -> Result<LedgerRecord> {
        let sequence_id = self.next_sequence_id()?;
        let version = read_schema_version(self.adapter, self.tables)?;

        Ok(LedgerRecord {
            sequence_id,
            timestamp: Utc::now().naive_utc(),
            actor: actor.to_string(),
            affected_tables: affected_tables_label(affected),
            affected_columns: ALL_COLUMNS.to_string(),
            remarks: remarks(version, overwrite),
        })
    }

    pub fn append(&self, record: &LedgerRecord) -> Result<()> {
        self.adapter.execute(&record.insert_sql(self.tables))?;
        info!(
            sequence_id = record.sequence_id,
            remarks = %record.remarks,
            "recorded ledger entry"
        );
        Ok(())
    }
}

fn affected_tables_label(affected: &TableSet) -> String {
    if affected.is_empty() {
        return NO_TABLES.to_string();
    }
    affected
        .iter()
        .map(TableName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn remarks(version: Option<i64>, overwrite: OverwritePolicy) -> String {
    match version {
        Some(version) => format!("created schema version {version} (overwrite={overwrite})"),
        None => format!("created schema without a recorded version (overwrite={overwrite})"),
    }
}

pub(crate) fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
