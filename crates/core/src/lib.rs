mod adapter;
mod config;
mod dialect;
mod error;
mod inventory;
mod ledger;
mod orchestrator;
mod policy;
mod prune;
mod reconcile;
mod renderer;
mod rewrite;
mod splitter;
mod statement;
mod table;
mod upgrade;

pub use adapter::DatabaseAdapter;
pub use config::{
    BASE_SCHEMA_VERSION, ConnectionConfig, DEFAULT_ACTOR, KeepTables, Mode, OverwritePolicy,
    ReconcileOptions, Version,
};
pub use dialect::{Dialect, IdentifierQuoting, TypeRewrite};
pub use error::{BoxError, ConfigError, ConnectError, Error, ExecutionError, Result};
pub use inventory::TableInventory;
pub use ledger::{LedgerRecord, LedgerTables, LedgerWriter, read_schema_version};
pub use orchestrator::{Orchestrator, Phase, RunReport};
pub use policy::{PolicyWarning, ResolvedPolicy, resolve_policy};
pub use prune::{PruneOutcome, Pruner};
pub use reconcile::{Action, ReconcileOutcome, Reconciler, plan_action};
pub use renderer::{Renderer, render_report};
pub use rewrite::{
    adapt_statement, quote_identifier, rewrite_identifier_quoting, rewrite_type_names,
};
pub use splitter::split_statements;
pub use statement::{NO_TABLE, Statement, StatementKind, parse_script};
pub use table::{TableName, TableSet, table_set};
pub use upgrade::{ScriptDirectoryUpgrader, UpgradeRequest, VersionUpgrader};
