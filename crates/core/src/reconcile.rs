use tracing::{debug, info, warn};

use crate::{
    DatabaseAdapter, Dialect, ExecutionError, OverwritePolicy, Statement, TableInventory,
    TableName, TableSet,
    rewrite::{adapt_statement, quote_identifier},
};

/// What the engine does with one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Existing table under the `none` policy; left as-is and kept.
    Preserve,
    /// Existing table named in the keep set.
    SkipKept { notice: bool },
    DropAndCreate,
    Empty,
    Create,
    /// Non-create statement targeting a kept table.
    SkipSeed,
    Execute,
}

/// Decides the action for one statement from the live inventory, the keep
/// set, and the overwrite policy. Pure.
#[must_use]
pub fn plan_action(
    statement: &Statement,
    inventory: &TableInventory,
    keep: &TableSet,
    overwrite: OverwritePolicy,
) -> Action {
    let Some(target) = statement.target() else {
        return Action::Execute;
    };

    if !statement.is_create() {
        return if keep.contains(target) {
            Action::SkipSeed
        } else {
            Action::Execute
        };
    }

    if !inventory.contains(target) {
        return Action::Create;
    }

    if keep.contains(target) {
        return Action::SkipKept {
            notice: overwrite != OverwritePolicy::Empty,
        };
    }

    match overwrite {
        OverwritePolicy::Drop => Action::DropAndCreate,
        OverwritePolicy::Empty => Action::Empty,
        OverwritePolicy::None => Action::Preserve,
    }
}

#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub created: TableSet,
    pub dropped: TableSet,
    pub emptied: TableSet,
    pub preserved: TableSet,
    /// Tables with at least one failed statement. The pruner leaves them alone.
    pub failed: TableSet,
    pub skipped_statements: usize,
    pub executed_sql: Vec<String>,
    pub errors: Vec<ExecutionError>,
}

pub struct Reconciler<'a> {
    adapter: &'a dyn DatabaseAdapter,
    dialect: &'a dyn Dialect,
    overwrite: OverwritePolicy,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(
        adapter: &'a dyn DatabaseAdapter,
        dialect: &'a dyn Dialect,
        overwrite: OverwritePolicy,
    ) -> Self {
        Self {
            adapter,
            dialect,
            overwrite,
        }
    }

    /// Applies every statement in order. Failures are collected, never
    /// propagated; once a table fails, later statements on it are blocked.
    /// Tables preserved under the `none` policy join `keep`.
    pub fn run(
        &self,
        statements: &[Statement],
        inventory: &mut TableInventory,
        keep: &mut TableSet,
    ) -> ReconcileOutcome {
        let mut pass = Pass {
            inventory,
            keep,
            outcome: ReconcileOutcome::default(),
        };

        for statement in statements {
            let sql = adapt_statement(statement, self.dialect);

            if let Some(target) = statement.target()
                && pass.outcome.failed.contains(target)
            {
                debug!(table = %target, "statement blocked by earlier failure");
                pass.outcome.errors.push(ExecutionError::Blocked {
                    table: target.to_string(),
                    sql,
                });
                continue;
            }

            let action = plan_action(statement, pass.inventory, pass.keep, self.overwrite);
            self.apply(action, statement.target(), &sql, &mut pass);
        }

        pass.outcome
    }

    fn apply(&self, action: Action, target: Option<&TableName>, sql: &str, pass: &mut Pass<'_>) {
        match (action, target) {
            (Action::Preserve, Some(table)) => {
                info!(table = %table, "preserving existing table");
                pass.keep.insert(table.clone());
                pass.outcome.preserved.insert(table.clone());
            }
            (Action::SkipKept { notice }, Some(table)) => {
                if notice {
                    info!(table = %table, "keeping existing table");
                    pass.outcome.preserved.insert(table.clone());
                } else {
                    debug!(table = %table, "keeping existing table");
                }
            }
            (Action::SkipSeed, Some(table)) => {
                debug!(table = %table, "skipping statement on kept table");
                pass.outcome.skipped_statements += 1;
            }
            (Action::DropAndCreate, Some(table)) => {
                info!(table = %table, "dropping table before recreating it");
                let drop = format!("DROP TABLE {}", self.live_identifier(table, pass));
                if !self.execute(&drop, Some(table), pass) {
                    return;
                }
                pass.inventory.record_dropped(table);
                pass.outcome.dropped.insert(table.clone());
                self.create(table, sql, pass);
            }
            (Action::Empty, Some(table)) => {
                info!(table = %table, "emptying table");
                let sql = format!("DELETE FROM {}", self.live_identifier(table, pass));
                if self.execute(&sql, Some(table), pass) {
                    pass.outcome.emptied.insert(table.clone());
                }
            }
            (Action::Create, Some(table)) => self.create(table, sql, pass),
            (_, target) => {
                self.execute(sql, target, pass);
            }
        }
    }

    /// The engine's own spelling of an existing table, quoted.
    fn live_identifier(&self, table: &TableName, pass: &Pass<'_>) -> String {
        quote_identifier(
            pass.inventory.live_name(table).as_str(),
            self.dialect.identifier_quoting(),
        )
    }

    fn create(&self, table: &TableName, sql: &str, pass: &mut Pass<'_>) {
        info!(table = %table, "creating table");
        if self.execute(sql, Some(table), pass) {
            pass.inventory.record_created(table);
            pass.outcome.created.insert(table.clone());
        }
    }

    fn execute(&self, sql: &str, table: Option<&TableName>, pass: &mut Pass<'_>) -> bool {
        match self.adapter.execute(sql) {
            Ok(()) => {
                pass.outcome.executed_sql.push(sql.to_string());
                true
            }
            Err(error) => {
                let error =
                    ExecutionError::from_adapter(error, table.map(TableName::as_str), sql);
                warn!(%error, "statement failed");
                if let Some(table) = table {
                    pass.outcome.failed.insert(table.clone());
                }
                pass.outcome.errors.push(error);
                false
            }
        }
    }
}

struct Pass<'s> {
    inventory: &'s mut TableInventory,
    keep: &'s mut TableSet,
    outcome: ReconcileOutcome,
}
