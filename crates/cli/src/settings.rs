use std::{
    fs,
    path::{Path, PathBuf},
};

use reconql_core::{
    BASE_SCHEMA_VERSION, ConfigError, DEFAULT_ACTOR, KeepTables, LedgerTables, Mode,
    OverwritePolicy, ReconcileOptions,
};
use serde::Deserialize;

use crate::{args::RunArgs, error_presentation::CliError};

/// Defaults loaded from `--config`. Command-line flags win over every field.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) overwrite: Option<String>,
    pub(crate) keep_tables: Option<Vec<String>>,
    pub(crate) target_version: Option<u32>,
    pub(crate) actor: Option<String>,
    pub(crate) upgrades_dir: Option<PathBuf>,
    pub(crate) ledger_table: Option<String>,
    pub(crate) version_table: Option<String>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self, CliError> {
        let yaml = fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&yaml).map_err(|source| CliError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) options: ReconcileOptions,
    pub(crate) ledger_tables: LedgerTables,
    pub(crate) upgrades_dir: Option<PathBuf>,
}

impl Settings {
    pub(crate) fn resolve(args: &RunArgs, file: FileConfig) -> Result<Self, ConfigError> {
        let overwrite = match args.overwrite.as_deref().or(file.overwrite.as_deref()) {
            Some(raw) => raw.parse::<OverwritePolicy>()?,
            None => OverwritePolicy::default(),
        };

        let keep_tables = if !args.keep_tables.is_empty() {
            KeepTables::listed(&args.keep_tables)?
        } else if let Some(names) = &file.keep_tables {
            KeepTables::listed(names)?
        } else {
            KeepTables::Existing
        };

        let mut ledger_tables = LedgerTables::default();
        if let Some(ledger_table) = file.ledger_table {
            ledger_tables.ledger_table = ledger_table;
        }
        if let Some(version_table) = file.version_table {
            ledger_tables.version_table = version_table;
        }

        let options = ReconcileOptions {
            overwrite,
            keep_tables,
            target_version: args
                .target_version
                .or(file.target_version)
                .unwrap_or(BASE_SCHEMA_VERSION),
            actor: args
                .actor
                .clone()
                .or(file.actor)
                .unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
            mode: if args.dry_run {
                Mode::DryRun
            } else {
                Mode::Apply
            },
        };
        options.validate()?;

        Ok(Self {
            options,
            ledger_tables,
            upgrades_dir: args.upgrades_dir.clone().or(file.upgrades_dir),
        })
    }
}
