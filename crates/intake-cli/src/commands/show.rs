//! `intake show` command implementation

use super::{format_time, new_table, print_json, OutputFormat};
use crate::api::ApiClient;
use crate::error::Result;
use colored::Colorize;
use comfy_table::Table;
use intake_common::{Record, Token};

pub async fn run(client: &ApiClient, token: &Token, format: OutputFormat) -> Result<()> {
    let record = client.get_record(token).await?;

    match format {
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Table => {
            println!("{}", format!("Record {}", record.token).bold());
            println!("  Created: {}", format_time(&record.created_at));
            println!("  Updated: {}", format_time(&record.updated_at));
            println!();
            if record.fields.is_empty() {
                println!("No answers submitted yet.");
            } else {
                println!("{}", record_table(&record));
            }
        }
    }

    Ok(())
}

/// One row per answered field, in name order.
pub fn record_table(record: &Record) -> Table {
    let mut table = new_table(vec!["Field", "Value"]);
    for (name, value) in &record.fields {
        table.add_row(vec![name.clone(), value.to_string()]);
    }
    table
}
