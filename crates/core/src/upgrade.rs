use std::{fs, path::PathBuf};

use tracing::{debug, info};

use crate::{
    BASE_SCHEMA_VERSION, ConfigError, DatabaseAdapter, Dialect, ExecutionError, LedgerTables,
    Result, TableSet, ledger::read_schema_version, rewrite::adapt_statement,
    statement::parse_script,
};

#[derive(Debug, Clone, Copy)]
pub struct UpgradeRequest<'a> {
    pub target_version: u32,
    /// Tables the upgrade must not touch.
    pub keep_tables: &'a TableSet,
}

/// Brings a reconciled schema from its recorded version up to a target
/// version. Responsible for writing version numbers.
pub trait VersionUpgrader {
    fn upgrade(
        &self,
        adapter: &dyn DatabaseAdapter,
        dialect: &dyn Dialect,
        request: &UpgradeRequest<'_>,
    ) -> Result<()>;
}

/// Applies `<dir>/<version>.sql` for every version after the recorded one.
#[derive(Debug, Clone)]
pub struct ScriptDirectoryUpgrader {
    dir: PathBuf,
    tables: LedgerTables,
}

impl ScriptDirectoryUpgrader {
    pub fn new(dir: impl Into<PathBuf>, tables: LedgerTables) -> Self {
        Self {
            dir: dir.into(),
            tables,
        }
    }

    fn script_path(&self, version: u32) -> PathBuf {
        self.dir.join(format!("{version}.sql"))
    }

    fn apply_step(
        &self,
        adapter: &dyn DatabaseAdapter,
        dialect: &dyn Dialect,
        version: u32,
        keep_tables: &TableSet,
    ) -> Result<()> {
        let path = self.script_path(version);
        let script = fs::read_to_string(&path).map_err(|source| ConfigError::UpgradeScript {
            version,
            path: path.display().to_string(),
            source,
        })?;

        for statement in parse_script(&script) {
            if let Some(target) = statement.target()
                && keep_tables.contains(target)
            {
                debug!(table = %target, version, "upgrade skips kept table");
                continue;
            }

            let sql = adapt_statement(&statement, dialect);
            adapter.execute(&sql).map_err(|error| {
                ExecutionError::from_adapter(
                    error,
                    statement.target().map(|table| table.as_str()),
                    &sql,
                )
            })?;
        }

        adapter.execute(&self.tables.record_version_sql(version))?;
        info!(version, "applied schema upgrade");
        Ok(())
    }
}

impl VersionUpgrader for ScriptDirectoryUpgrader {
    fn upgrade(
        &self,
        adapter: &dyn DatabaseAdapter,
        dialect: &dyn Dialect,
        request: &UpgradeRequest<'_>,
    ) -> Result<()> {
        let current = read_schema_version(adapter, &self.tables)?
            .and_then(|version| u32::try_from(version).ok())
            .unwrap_or(BASE_SCHEMA_VERSION);

        for version in (current + 1)..=request.target_version {
            self.apply_step(adapter, dialect, version, request.keep_tables)?;
        }
        Ok(())
    }
}
