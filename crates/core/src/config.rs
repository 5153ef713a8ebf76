use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::{ConfigError, TableName, TableSet};

/// Schema version produced by the base script. Lower targets are rejected.
pub const BASE_SCHEMA_VERSION: u32 = 19;

pub const DEFAULT_ACTOR: &str = "reconql";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub socket: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl ConnectionConfig {
    #[must_use]
    pub fn for_database(database: impl Into<String>) -> Self {
        Self {
            host: None,
            port: None,
            user: None,
            password: None,
            database: database.into(),
            socket: None,
            extra: BTreeMap::new(),
        }
    }
}

/// What happens to an existing table the script creates and the caller did
/// not keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverwritePolicy {
    #[default]
    None,
    Drop,
    Empty,
}

impl OverwritePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Drop => "drop",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverwritePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "drop" => Ok(Self::Drop),
            "empty" => Ok(Self::Empty),
            _ => Err(ConfigError::UnknownPolicy(value.to_string())),
        }
    }
}

/// Tables guaranteed untouched by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeepTables {
    /// Every table present when the run starts. Only meaningful for
    /// [`OverwritePolicy::None`]; the other policies treat it as empty.
    #[default]
    Existing,
    Listed(TableSet),
}

impl KeepTables {
    pub fn listed<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| TableName::parse(name.as_ref()))
            .collect::<Result<TableSet, _>>()
            .map(Self::Listed)
    }

    #[must_use]
    pub const fn is_explicit(&self) -> bool {
        matches!(self, Self::Listed(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Apply,
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub overwrite: OverwritePolicy,
    pub keep_tables: KeepTables,
    pub target_version: u32,
    pub actor: String,
    pub mode: Mode,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::None,
            keep_tables: KeepTables::Existing,
            target_version: BASE_SCHEMA_VERSION,
            actor: DEFAULT_ACTOR.to_string(),
            mode: Mode::Apply,
        }
    }
}

impl ReconcileOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_version < BASE_SCHEMA_VERSION {
            return Err(ConfigError::TargetVersionBelowBase {
                requested: self.target_version,
                minimum: BASE_SCHEMA_VERSION,
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn wants_upgrade(&self) -> bool {
        self.target_version > BASE_SCHEMA_VERSION
    }
}
