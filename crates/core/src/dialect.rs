use crate::{ConnectionConfig, DatabaseAdapter, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierQuoting {
    /// Identifiers are quoted with double quotes; back-ticks are rewritten.
    Ansi,
    Backtick,
}

/// Whole-word type name replacement applied to CREATE statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRewrite {
    pub from: &'static str,
    pub to: &'static str,
}

pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>>;
    fn identifier_quoting(&self) -> IdentifierQuoting;

    fn type_rewrites(&self) -> &'static [TypeRewrite] {
        &[]
    }

    /// Name prefixes of engine-owned tables the pruner must never drop.
    fn system_table_prefixes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Advance warning shown when the drop policy is requested.
    fn drop_caveat(&self) -> Option<&'static str> {
        None
    }
}
