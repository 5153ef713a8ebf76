use std::{
    cmp::Ordering,
    collections::BTreeSet,
    fmt,
    hash::{Hash, Hasher},
};

use crate::ConfigError;

/// A table identifier as written in the script or reported by the engine.
///
/// Equality, ordering, and hashing ignore ASCII case so that names folded by
/// the engine (PostgreSQL lowercases unquoted identifiers) still match the
/// script spelling. The original spelling is kept for display and SQL.
#[derive(Debug, Clone)]
pub struct TableName {
    raw: String,
    key: String,
}

pub type TableSet = BTreeSet<TableName>;

impl TableName {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim().to_string();
        let key = raw.to_ascii_lowercase();
        Self { raw, key }
    }

    /// Accepts only plain identifiers: a letter or underscore followed by
    /// letters, digits, or underscores.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if is_plain_identifier(trimmed) {
            Ok(Self::new(trimmed))
        } else {
            Err(ConfigError::InvalidTableName(raw.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.key.starts_with(&prefix.to_ascii_lowercase())
    }
}

pub(crate) fn is_plain_identifier(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

impl PartialEq for TableName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TableName {}

impl PartialOrd for TableName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TableName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for TableName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for TableName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

pub fn table_set<I, S>(names: I) -> TableSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(TableName::new).collect()
}
