//! `intake audit` command implementation
//!
//! Prints a record's field-level change history, newest first.

use super::{format_time, new_table, or_empty, print_json, OutputFormat};
use crate::api::ApiClient;
use crate::error::Result;
use comfy_table::Table;
use intake_common::{AuditEntry, Token};

pub async fn run(client: &ApiClient, token: &Token, format: OutputFormat) -> Result<()> {
    let entries = client.audit_log(token).await?;

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Table if entries.is_empty() => {
            println!("No changes recorded for {}.", token);
        }
        OutputFormat::Table => println!("{}", audit_table(&entries)),
    }

    Ok(())
}

pub fn audit_table(entries: &[AuditEntry]) -> Table {
    let mut table = new_table(vec!["Changed at", "Field", "Old value", "New value"]);
    for entry in entries {
        table.add_row(vec![
            format_time(&entry.changed_at),
            entry.field_name.clone(),
            or_empty(entry.old_value.as_deref()),
            or_empty(entry.new_value.as_deref()),
        ]);
    }
    table
}
