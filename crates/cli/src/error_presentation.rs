use std::{io, path::PathBuf, process::ExitCode};

use miette::Report;

const ORCHESTRATOR_CONTEXT: &str = "while reconciling schema";
const FILE_READ_CONTEXT: &str = "while reading schema script";
const STDIN_READ_CONTEXT: &str = "while reading schema script from stdin";
const CONFIG_READ_CONTEXT: &str = "while reading config file";

const RUNTIME_EXIT_CODE: u8 = 1;
const USAGE_EXIT_CODE: u8 = 2;

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    MissingScriptInput,
    ReadFile {
        path: PathBuf,
        source: io::Error,
    },
    ReadStdin(io::Error),
    ReadConfig {
        path: PathBuf,
        source: io::Error,
    },
    ParseConfig {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    Core(reconql_core::Error),
}

impl From<reconql_core::Error> for CliError {
    fn from(value: reconql_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<reconql_core::ConfigError> for CliError {
    fn from(value: reconql_core::ConfigError) -> Self {
        Self::Core(value.into())
    }
}

impl CliError {
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::MissingScriptInput => ExitCode::from(USAGE_EXIT_CODE),
            _ => ExitCode::from(RUNTIME_EXIT_CODE),
        }
    }
}

pub(crate) fn partial_run_exit_code() -> ExitCode {
    ExitCode::from(RUNTIME_EXIT_CODE)
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::MissingScriptInput => format!("[usage] {}", missing_script_message()),
        CliError::ReadFile { path, source } => {
            let context = format!("{FILE_READ_CONTEXT} `{}`", path.display());
            let report = report_with_context(source, context);
            format!("[io] {report}")
        }
        CliError::ReadStdin(source) => {
            let report = report_with_context(source, STDIN_READ_CONTEXT);
            format!("[io] {report}")
        }
        CliError::ReadConfig { path, source } => {
            let context = format!("{CONFIG_READ_CONTEXT} `{}`", path.display());
            let report = report_with_context(source, context);
            format!("[io] {report}")
        }
        CliError::ParseConfig { path, source } => {
            let context = format!("{CONFIG_READ_CONTEXT} `{}`", path.display());
            let report = report_with_context(source, context);
            format!("[config] {report}")
        }
        CliError::Core(source) => {
            let category = core_category(&source);
            let report = report_with_context(source, ORCHESTRATOR_CONTEXT);
            format!("[{category}] {report}")
        }
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: Into<String>,
{
    let context = context.into();
    let anyhow_error = anyhow::Error::new(source).context(context);
    miette::miette!("{anyhow_error:#}")
}

fn core_category(error: &reconql_core::Error) -> &'static str {
    match error {
        reconql_core::Error::Config(_) => "config",
        reconql_core::Error::Connect(_) => "connect",
        reconql_core::Error::Execute(_) => "execute",
    }
}

fn missing_script_message() -> &'static str {
    "missing schema script: pass --file <PATH> or pipe SQL via stdin"
}
