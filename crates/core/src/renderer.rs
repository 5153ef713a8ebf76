use std::fmt::Write as _;

use crate::{Mode, RunReport, TableName, TableSet};

const DRY_RUN_HEADER: &str = "-- Planned statements (dry run):";

pub struct Renderer<'a> {
    report: &'a RunReport,
}

impl<'a> Renderer<'a> {
    #[must_use]
    pub const fn new(report: &'a RunReport) -> Self {
        Self { report }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut rendered = String::new();

        if self.report.mode == Mode::DryRun {
            self.render_planned_sql(&mut rendered);
        }

        for warning in &self.report.warnings {
            let _ = writeln!(rendered, "warning: {warning}");
        }

        self.render_tables(&mut rendered, "created", &self.report.created);
        self.render_tables(&mut rendered, "dropped", &self.report.dropped);
        self.render_tables(&mut rendered, "emptied", &self.report.emptied);
        self.render_tables(&mut rendered, "preserved", &self.report.preserved);
        self.render_tables(&mut rendered, "pruned", &self.report.pruned);

        if self.report.skipped_statements > 0 {
            let _ = writeln!(
                rendered,
                "skipped: {} statement(s) on kept tables",
                self.report.skipped_statements
            );
        }
        if let Some(version) = self.report.schema_version {
            let _ = writeln!(rendered, "schema version: {version}");
        }
        if let Some(record) = &self.report.ledger {
            let _ = writeln!(
                rendered,
                "ledger: #{} {}",
                record.sequence_id, record.remarks
            );
        }

        for error in &self.report.errors {
            let _ = writeln!(rendered, "error: {error}");
        }

        rendered
    }

    fn render_planned_sql(&self, rendered: &mut String) {
        rendered.push_str(DRY_RUN_HEADER);
        rendered.push('\n');
        for sql in &self.report.executed_sql {
            rendered.push_str(sql);
            rendered.push_str(";\n");
        }
        rendered.push('\n');
    }

    fn render_tables(&self, rendered: &mut String, label: &str, tables: &TableSet) {
        if tables.is_empty() {
            return;
        }
        let names = tables
            .iter()
            .map(TableName::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(rendered, "{label}: {names}");
    }
}

#[must_use]
pub fn render_report(report: &RunReport) -> String {
    Renderer::new(report).render()
}
