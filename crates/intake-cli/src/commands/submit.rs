//! `intake submit` command implementation
//!
//! Builds an update body from a JSON file and/or `--field name=value`
//! arguments. Values are sent as strings and typed by the server; an empty
//! value clears the field.

use super::show::record_table;
use super::{format_time, print_json, OutputFormat};
use crate::api::ApiClient;
use crate::error::{CliError, Result};
use colored::Colorize;
use intake_common::Token;
use serde_json::{Map, Value};
use std::path::Path;

/// Parse one `name=value` argument. Used as a clap value parser.
pub fn parse_field_assignment(arg: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{}'", arg));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Merge the file body and the field arguments; arguments win.
pub fn build_body(file: Option<&Path>, fields: &[(String, String)]) -> Result<Map<String, Value>> {
    let mut body = match file {
        Some(path) => read_body(path)?,
        None => Map::new(),
    };

    for (name, value) in fields {
        let value = if value.is_empty() {
            Value::Null
        } else {
            Value::String(value.clone())
        };
        body.insert(name.clone(), value);
    }

    if body.is_empty() {
        return Err(CliError::invalid_submission(
            "nothing to submit; pass --field NAME=VALUE or --file body.json",
        ));
    }
    Ok(body)
}

fn read_body(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str(&contents)? {
        Value::Object(map) => Ok(map),
        _ => Err(CliError::invalid_submission(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

pub async fn run(
    client: &ApiClient,
    token: &Token,
    file: Option<&Path>,
    fields: &[(String, String)],
    format: OutputFormat,
) -> Result<()> {
    let body = build_body(file, fields)?;
    let record = client.submit(token, &body).await?;

    match format {
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Table => {
            println!(
                "{} {} (updated {})",
                "Saved".green().bold(),
                record.token,
                format_time(&record.updated_at)
            );
            println!("{}", record_table(&record));
        }
    }

    Ok(())
}
