use std::fmt;

use crate::{Dialect, KeepTables, OverwritePolicy, TableInventory, TableName, TableSet};

/// Advisory raised before reconciliation. Never blocks the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyWarning {
    /// The drop policy rebuilds every other table but keeps the ledger, so
    /// later versioned upgrades may see a ledger that does not match the schema.
    LedgerKeptUnderDrop { ledger_table: String },
    RestrictedDrop {
        dialect: &'static str,
        caveat: &'static str,
    },
    UpgradeUnavailable { target_version: u32 },
}

impl fmt::Display for PolicyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LedgerKeptUnderDrop { ledger_table } => write!(
                f,
                "ledger table `{ledger_table}` is kept while overwrite=drop rebuilds the rest of the schema"
            ),
            Self::RestrictedDrop { dialect, caveat } => {
                write!(f, "overwrite=drop on {dialect} may fail: {caveat}")
            }
            Self::UpgradeUnavailable { target_version } => write!(
                f,
                "target version {target_version} requested but no version upgrader is configured"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPolicy {
    pub overwrite: OverwritePolicy,
    pub keep: TableSet,
    pub warnings: Vec<PolicyWarning>,
}

/// Turns the caller's keep request into a concrete keep set for this run.
///
/// `KeepTables::Existing` resolves to the live inventory under the `none`
/// policy and to nothing under `drop` and `empty`. The `empty` policy always
/// keeps the ledger table.
#[must_use]
pub fn resolve_policy(
    overwrite: OverwritePolicy,
    keep_tables: &KeepTables,
    inventory: &TableInventory,
    ledger_table: &TableName,
    dialect: &dyn Dialect,
) -> ResolvedPolicy {
    let mut keep = match (keep_tables, overwrite) {
        (KeepTables::Listed(tables), _) => tables.clone(),
        (KeepTables::Existing, OverwritePolicy::None) => inventory.tables().clone(),
        (KeepTables::Existing, OverwritePolicy::Drop | OverwritePolicy::Empty) => TableSet::new(),
    };

    let mut warnings = Vec::new();
    match overwrite {
        OverwritePolicy::Empty => {
            keep.insert(ledger_table.clone());
        }
        OverwritePolicy::Drop => {
            if keep.contains(ledger_table) {
                warnings.push(PolicyWarning::LedgerKeptUnderDrop {
                    ledger_table: ledger_table.to_string(),
                });
            }
            if let Some(caveat) = dialect.drop_caveat() {
                warnings.push(PolicyWarning::RestrictedDrop {
                    dialect: dialect.name(),
                    caveat,
                });
            }
        }
        OverwritePolicy::None => {}
    }

    ResolvedPolicy {
        overwrite,
        keep,
        warnings,
    }
}
