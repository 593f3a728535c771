//! `intake list` command implementation
//!
//! Shows the overview of every record, most recently updated first.

use super::{format_time, new_table, or_empty, print_json, OutputFormat};
use crate::api::ApiClient;
use crate::error::Result;
use comfy_table::Table;
use intake_common::RecordOverview;

pub async fn run(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let overview = client.list_records().await?;

    match format {
        OutputFormat::Json => print_json(&overview)?,
        OutputFormat::Table if overview.is_empty() => {
            println!("No records yet.");
            println!("Run 'intake invite' to issue the first invitation.");
        }
        OutputFormat::Table => {
            println!("{}", overview_table(&overview));
            println!("{} record(s)", overview.len());
        }
    }

    Ok(())
}

/// Render the overview projection, preserving the server's order.
pub fn overview_table(overview: &[RecordOverview]) -> Table {
    let mut table = new_table(vec![
        "Token",
        "First name",
        "Last name",
        "Age",
        "Country",
        "Nationality",
        "Updated",
    ]);

    for entry in overview {
        table.add_row(vec![
            entry.token.to_string(),
            or_empty(entry.first_name.as_deref()),
            or_empty(entry.last_name.as_deref()),
            entry.age.map(|age| age.to_string()).unwrap_or_else(|| "-".into()),
            or_empty(entry.country.as_deref()),
            or_empty(entry.nationality.as_deref()),
            format_time(&entry.updated_at),
        ]);
    }

    table
}
