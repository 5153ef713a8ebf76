use std::fmt;

use tracing::{debug, info, warn};

use crate::{
    BASE_SCHEMA_VERSION, ConnectionConfig, DatabaseAdapter, Dialect, ExecutionError, LedgerRecord,
    LedgerTables, LedgerWriter, Mode, PolicyWarning, Pruner, ReconcileOptions, Reconciler, Result,
    TableInventory, TableSet, UpgradeRequest, Version, VersionUpgrader,
    ledger::read_schema_version, policy::resolve_policy, statement::parse_script,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connected,
    Inventoried,
    Reconciled,
    Pruned,
    Ledgered,
    HandedOff,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connected => "connected",
            Self::Inventoried => "inventoried",
            Self::Reconciled => "reconciled",
            Self::Pruned => "pruned",
            Self::Ledgered => "ledgered",
            Self::HandedOff => "handed-off",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Everything one invocation did. Per-statement failures live in `errors`.
#[derive(Debug, Default)]
pub struct RunReport {
    pub mode: Mode,
    pub phases: Vec<Phase>,
    pub prior_version: Option<i64>,
    pub schema_version: Option<i64>,
    pub keep: TableSet,
    pub created: TableSet,
    pub dropped: TableSet,
    pub emptied: TableSet,
    pub preserved: TableSet,
    pub pruned: TableSet,
    pub skipped_statements: usize,
    pub executed_sql: Vec<String>,
    pub warnings: Vec<PolicyWarning>,
    pub ledger: Option<LedgerRecord>,
    pub errors: Vec<ExecutionError>,
}

impl RunReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn enter(&mut self, phase: Phase) {
        debug!(%phase, "entering phase");
        self.phases.push(phase);
    }

    fn affected_tables(&self) -> TableSet {
        self.created
            .iter()
            .chain(&self.emptied)
            .chain(&self.pruned)
            .cloned()
            .collect()
    }
}

pub struct Orchestrator<'a> {
    dialect: &'a dyn Dialect,
    ledger_tables: LedgerTables,
    upgrader: Option<&'a dyn VersionUpgrader>,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            ledger_tables: LedgerTables::default(),
            upgrader: None,
        }
    }

    #[must_use]
    pub fn with_ledger_tables(mut self, ledger_tables: LedgerTables) -> Self {
        self.ledger_tables = ledger_tables;
        self
    }

    #[must_use]
    pub fn with_upgrader(mut self, upgrader: &'a dyn VersionUpgrader) -> Self {
        self.upgrader = Some(upgrader);
        self
    }

    /// Validates the options, connects, and reconciles. Configuration and
    /// connection failures are returned before anything is executed.
    pub fn run(
        &self,
        connection_config: &ConnectionConfig,
        script: &str,
        options: &ReconcileOptions,
    ) -> Result<RunReport> {
        options.validate()?;
        let adapter = self.dialect.connect(connection_config)?;
        self.run_with_adapter(adapter.as_ref(), script, options)
    }

    pub fn run_with_adapter(
        &self,
        adapter: &dyn DatabaseAdapter,
        script: &str,
        options: &ReconcileOptions,
    ) -> Result<RunReport> {
        options.validate()?;
        match options.mode {
            Mode::Apply => self.reconcile(adapter, script, options),
            Mode::DryRun => {
                let dry_run = DryRunAdapter::new(adapter);
                self.reconcile(&dry_run, script, options)
            }
        }
    }

    fn reconcile(
        &self,
        adapter: &dyn DatabaseAdapter,
        script: &str,
        options: &ReconcileOptions,
    ) -> Result<RunReport> {
        let mut report = RunReport {
            mode: options.mode,
            ..RunReport::default()
        };
        report.enter(Phase::Connected);
        if let Ok(Version {
            major,
            minor,
            patch,
        }) = adapter.server_version()
        {
            debug!(dialect = self.dialect.name(), "server version {major}.{minor}.{patch}");
        }

        let mut inventory = TableInventory::load(adapter)?;
        match read_schema_version(adapter, &self.ledger_tables) {
            Ok(version) => report.prior_version = version,
            Err(error) => {
                let error = ExecutionError::from_adapter(
                    error,
                    Some(self.ledger_tables.version_table.as_str()),
                    &self.ledger_tables.latest_version_sql(),
                );
                warn!(%error, "prior schema version unavailable");
                report.errors.push(error);
            }
        }
        report.enter(Phase::Inventoried);

        let resolved = resolve_policy(
            options.overwrite,
            &options.keep_tables,
            &inventory,
            &self.ledger_tables.ledger_name(),
            self.dialect,
        );
        report.warnings = resolved.warnings;
        for warning in &report.warnings {
            warn!(%warning, "policy warning");
        }
        let mut keep = resolved.keep;

        let statements = parse_script(script);
        let reconciler = Reconciler::new(adapter, self.dialect, options.overwrite);
        let outcome = reconciler.run(&statements, &mut inventory, &mut keep);
        report.created = outcome.created;
        report.dropped = outcome.dropped;
        report.emptied = outcome.emptied;
        report.preserved = outcome.preserved;
        report.skipped_statements = outcome.skipped_statements;
        report.executed_sql = outcome.executed_sql;
        report.errors.extend(outcome.errors);
        report.enter(Phase::Reconciled);

        let retained = report
            .created
            .iter()
            .chain(&report.emptied)
            .chain(&outcome.failed)
            .cloned()
            .collect::<TableSet>();
        let pruned = Pruner::new(adapter, self.dialect).prune(&keep, &retained);
        report.pruned = pruned.pruned;
        report.executed_sql.extend(pruned.executed_sql);
        report.errors.extend(pruned.errors);
        report.keep = keep;
        report.enter(Phase::Pruned);

        if options.mode == Mode::Apply {
            self.write_ledger(adapter, options, &mut report);
            self.hand_off(adapter, options, &mut report);
        } else {
            debug!("dry run: ledger and upgrade hand-off skipped");
        }

        report.enter(Phase::Closed);
        info!(
            created = report.created.len(),
            pruned = report.pruned.len(),
            errors = report.errors.len(),
            "reconciliation finished"
        );
        Ok(report)
    }

    fn write_ledger(
        &self,
        adapter: &dyn DatabaseAdapter,
        options: &ReconcileOptions,
        report: &mut RunReport,
    ) {
        let writer = LedgerWriter::new(adapter, &self.ledger_tables);
        let affected = report.affected_tables();
        let written = writer
            .compose(&options.actor, &affected, options.overwrite)
            .and_then(|record| writer.append(&record).map(|()| record));

        match written {
            Ok(record) => {
                report.schema_version = read_schema_version(adapter, &self.ledger_tables)
                    .ok()
                    .flatten();
                report.ledger = Some(record);
                report.enter(Phase::Ledgered);
            }
            Err(error) => {
                let error = ExecutionError::from_adapter(
                    error,
                    Some(self.ledger_tables.ledger_table.as_str()),
                    "<ledger record>",
                );
                warn!(%error, "failed to write ledger record");
                report.errors.push(error);
            }
        }
    }

    fn hand_off(
        &self,
        adapter: &dyn DatabaseAdapter,
        options: &ReconcileOptions,
        report: &mut RunReport,
    ) {
        if !options.wants_upgrade() {
            return;
        }
        let Some(upgrader) = self.upgrader else {
            let warning = PolicyWarning::UpgradeUnavailable {
                target_version: options.target_version,
            };
            warn!(%warning, "upgrade hand-off skipped");
            report.warnings.push(warning);
            return;
        };

        let mut steps = Vec::new();
        if options.keep_tables.is_explicit()
            && let Some(prior) = report
                .prior_version
                .and_then(|version| u32::try_from(version).ok())
                .filter(|version| *version > BASE_SCHEMA_VERSION)
        {
            steps.push((prior, report.keep.clone()));
        }
        steps.push((options.target_version, TableSet::new()));

        for (target_version, keep_tables) in steps {
            info!(target_version, "handing off to version upgrader");
            let request = UpgradeRequest {
                target_version,
                keep_tables: &keep_tables,
            };
            if let Err(error) = upgrader.upgrade(adapter, self.dialect, &request) {
                let error = ExecutionError::UpgradeFailed {
                    target_version,
                    source: Box::new(error),
                };
                warn!(%error, "version upgrade failed");
                report.errors.push(error);
                return;
            }
        }

        report.schema_version = read_schema_version(adapter, &self.ledger_tables)
            .ok()
            .flatten();
        report.enter(Phase::HandedOff);
    }
}

/// Reads pass through to the real connection; writes are logged and
/// reported as successful.
struct DryRunAdapter<'a> {
    inner: &'a dyn DatabaseAdapter,
}

impl<'a> DryRunAdapter<'a> {
    const fn new(inner: &'a dyn DatabaseAdapter) -> Self {
        Self { inner }
    }
}

impl DatabaseAdapter for DryRunAdapter<'_> {
    fn table_names(&self) -> Result<Vec<String>> {
        self.inner.table_names()
    }

    fn execute(&self, sql: &str) -> Result<()> {
        debug!(sql, "dry run");
        Ok(())
    }

    fn query_integer(&self, sql: &str) -> Result<Option<i64>> {
        self.inner.query_integer(sql)
    }

    fn server_version(&self) -> Result<Version> {
        self.inner.server_version()
    }
}
