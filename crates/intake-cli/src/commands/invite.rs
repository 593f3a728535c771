//! `intake invite` command implementation
//!
//! Issues a new token and prints the link to send to the respondent.

use super::{print_json, OutputFormat};
use crate::api::ApiClient;
use crate::error::Result;
use colored::Colorize;

pub async fn run(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let invitation = client.issue_invitation().await?;

    match format {
        OutputFormat::Json => print_json(&invitation)?,
        OutputFormat::Table => {
            println!("{}", "Invitation issued".green().bold());
            println!("  Token: {}", invitation.token);
            println!("  Link:  {}", invitation.link.cyan());
        }
    }

    Ok(())
}
