use tracing::{debug, info, warn};

use crate::{
    DatabaseAdapter, Dialect, ExecutionError, TableInventory, TableName, TableSet,
    rewrite::quote_identifier,
};

#[derive(Debug, Default)]
pub struct PruneOutcome {
    pub pruned: TableSet,
    pub executed_sql: Vec<String>,
    pub errors: Vec<ExecutionError>,
}

/// Drops live tables that the run neither kept nor rebuilt.
pub struct Pruner<'a> {
    adapter: &'a dyn DatabaseAdapter,
    dialect: &'a dyn Dialect,
}

impl<'a> Pruner<'a> {
    #[must_use]
    pub fn new(adapter: &'a dyn DatabaseAdapter, dialect: &'a dyn Dialect) -> Self {
        Self { adapter, dialect }
    }

    /// `retained` holds the tables this run created, emptied in place, or
    /// failed on.
    pub fn prune(&self, keep: &TableSet, retained: &TableSet) -> PruneOutcome {
        let mut outcome = PruneOutcome::default();

        let inventory = match TableInventory::load(self.adapter) {
            Ok(inventory) => inventory,
            Err(error) => {
                warn!(%error, "table inventory unavailable, skipping prune");
                outcome.errors.push(ExecutionError::from_adapter(
                    error,
                    None,
                    "<table inventory>",
                ));
                return outcome;
            }
        };

        for table in self.superfluous(&inventory, keep, retained) {
            let sql = format!(
                "DROP TABLE {}",
                quote_identifier(table.as_str(), self.dialect.identifier_quoting())
            );
            match self.adapter.execute(&sql) {
                Ok(()) => {
                    info!(table = %table, "pruned superfluous table");
                    outcome.executed_sql.push(sql);
                    outcome.pruned.insert(table);
                }
                Err(error) => {
                    let error = ExecutionError::from_adapter(error, Some(table.as_str()), &sql);
                    warn!(%error, "failed to prune table");
                    outcome.errors.push(error);
                }
            }
        }

        outcome
    }

    /// Live tables outside `keep ∪ retained`, engine-internal tables excluded.
    #[must_use]
    pub fn superfluous(
        &self,
        inventory: &TableInventory,
        keep: &TableSet,
        retained: &TableSet,
    ) -> Vec<TableName> {
        inventory
            .tables()
            .iter()
            .filter(|table| {
                if self.is_system_table(table) {
                    debug!(table = %table, "ignoring engine-internal table");
                    return false;
                }
                !keep.contains(*table) && !retained.contains(*table)
            })
            .cloned()
            .collect()
    }

    fn is_system_table(&self, table: &TableName) -> bool {
        self.dialect
            .system_table_prefixes()
            .iter()
            .any(|prefix| table.has_prefix(prefix))
    }
}
