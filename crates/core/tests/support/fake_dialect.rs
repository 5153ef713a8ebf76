use std::sync::atomic::{AtomicUsize, Ordering};

use reconql_core::{
    ConnectionConfig, DatabaseAdapter, Dialect, IdentifierQuoting, Result, TypeRewrite,
};

use super::fake_adapter::FakeAdapter;

#[derive(Debug)]
pub struct FakeDialect {
    pub quoting: IdentifierQuoting,
    pub drop_caveat: Option<&'static str>,
    connect_count: AtomicUsize,
}

impl Default for FakeDialect {
    fn default() -> Self {
        Self {
            quoting: IdentifierQuoting::Ansi,
            drop_caveat: None,
            connect_count: AtomicUsize::new(0),
        }
    }
}

#[allow(dead_code)]
impl FakeDialect {
    pub fn with_drop_caveat(caveat: &'static str) -> Self {
        Self {
            drop_caveat: Some(caveat),
            ..Self::default()
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }
}

impl Dialect for FakeDialect {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeAdapter::default()))
    }

    fn identifier_quoting(&self) -> IdentifierQuoting {
        self.quoting
    }

    fn type_rewrites(&self) -> &'static [TypeRewrite] {
        &[TypeRewrite {
            from: "DATETIME",
            to: "TIMESTAMP",
        }]
    }

    fn system_table_prefixes(&self) -> &'static [&'static str] {
        &["sys_"]
    }

    fn drop_caveat(&self) -> Option<&'static str> {
        self.drop_caveat
    }
}
