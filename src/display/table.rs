use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::controller::RowView;
use crate::resources::Resource;

use super::{format_active, format_audit_cell};

/// A row in a resource listing
#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    title: String,
    #[tabled(rename = "Details")]
    details: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Last modified")]
    modified: String,
}

/// Render list rows as a table
pub fn record_table<R: Resource>(rows: &[RowView<R>]) -> String {
    let rows: Vec<RecordRow> = rows
        .iter()
        .map(|row| {
            let audit = row.audit.as_ref();
            let mut status = format_active(row.record.is_active());
            if row.busy {
                status.push_str(" (saving)");
            }
            RecordRow {
                id: row.record.id().to_string(),
                title: row.record.title(),
                details: row.record.subtitle().unwrap_or_default(),
                status,
                created: format_audit_cell(audit.and_then(|a| a.created.as_ref())),
                modified: format_audit_cell(audit.and_then(|a| a.last_modified.as_ref())),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}
