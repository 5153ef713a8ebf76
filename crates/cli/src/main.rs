mod args;
mod error_presentation;
mod logging;
mod settings;

use std::{
    fs,
    io::{self, IsTerminal, Read},
    path::Path,
    process::ExitCode,
};

use clap::Parser;
use reconql_core::{
    ConnectionConfig, Dialect, Orchestrator, RunReport, ScriptDirectoryUpgrader, render_report,
};
use tracing::{debug, warn};

use crate::{
    args::{Cli, RunArgs},
    error_presentation::{CliError, CliResult, partial_run_exit_code, render_runtime_error},
    settings::{FileConfig, Settings},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (dialect, connection, run) = cli.command.into_parts();
    logging::init(run.verbose);

    match reconcile(dialect.as_ref(), &connection, &run) {
        Ok(report) => {
            print!("{}", render_report(&report));
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                warn!(errors = report.errors.len(), "reconciliation finished with failures");
                partial_run_exit_code()
            }
        }
        Err(error) => {
            let exit_code = error.exit_code();
            eprintln!("{}", render_runtime_error(error));
            exit_code
        }
    }
}

fn reconcile(
    dialect: &dyn Dialect,
    connection: &ConnectionConfig,
    args: &RunArgs,
) -> CliResult<RunReport> {
    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(args, file_config)?;
    let script = read_script(args.file.as_deref())?;

    let upgrader = settings
        .upgrades_dir
        .as_ref()
        .map(|dir| ScriptDirectoryUpgrader::new(dir, settings.ledger_tables.clone()));
    let mut orchestrator =
        Orchestrator::new(dialect).with_ledger_tables(settings.ledger_tables.clone());
    if let Some(upgrader) = &upgrader {
        orchestrator = orchestrator.with_upgrader(upgrader);
    }

    debug!(dialect = dialect.name(), database = %connection.database, "starting reconciliation");
    Ok(orchestrator.run(connection, &script, &settings.options)?)
}

fn read_script(path: Option<&Path>) -> CliResult<String> {
    let script = match path {
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?,
        None => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                return Err(CliError::MissingScriptInput);
            }
            let mut script = String::new();
            stdin
                .read_to_string(&mut script)
                .map_err(CliError::ReadStdin)?;
            script
        }
    };

    if script.trim().is_empty() {
        return Err(CliError::MissingScriptInput);
    }
    Ok(script)
}
