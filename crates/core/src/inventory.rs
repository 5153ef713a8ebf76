use crate::{DatabaseAdapter, Result, TableName, TableSet};

/// The live table set, updated as the run creates and drops tables so later
/// decisions see the cumulative effect of earlier statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableInventory {
    tables: TableSet,
}

impl TableInventory {
    pub fn load(adapter: &dyn DatabaseAdapter) -> Result<Self> {
        let tables = adapter
            .table_names()?
            .into_iter()
            .map(TableName::new)
            .collect();
        Ok(Self { tables })
    }

    #[must_use]
    pub const fn from_tables(tables: TableSet) -> Self {
        Self { tables }
    }

    #[must_use]
    pub fn contains(&self, table: &TableName) -> bool {
        self.tables.contains(table)
    }

    /// The stored spelling of `table`, falling back to `table` itself.
    #[must_use]
    pub fn live_name<'t>(&'t self, table: &'t TableName) -> &'t TableName {
        self.tables.get(table).unwrap_or(table)
    }

    #[must_use]
    pub const fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub(crate) fn record_created(&mut self, table: &TableName) {
        self.tables.insert(table.clone());
    }

    pub(crate) fn record_dropped(&mut self, table: &TableName) {
        self.tables.remove(table);
    }
}
