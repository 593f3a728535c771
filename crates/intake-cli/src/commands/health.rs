//! `intake health` command implementation

use super::{print_json, OutputFormat};
use crate::api::ApiClient;
use crate::error::{CliError, Result};
use colored::Colorize;

/// Print the server's health; an unhealthy store fails the command.
pub async fn run(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            let status = if health.is_healthy() {
                health.status.green().bold()
            } else {
                health.status.red().bold()
            };
            println!("Server:  {}", client.base_url());
            println!("Status:  {}", status);
            println!("Backend: {}", health.backend);
            if let Some(ref error) = health.error {
                println!("Error:   {}", error);
            }
        }
    }

    if health.is_healthy() {
        Ok(())
    } else {
        Err(CliError::Unhealthy {
            url: client.base_url().to_string(),
            backend: health.backend,
        })
    }
}
