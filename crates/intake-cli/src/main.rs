//! Intake CLI - Main entry point

use clap::Parser;
use intake_cli::api::ApiClient;
use intake_cli::commands::{self, OutputFormat};
use intake_cli::{Cli, Commands};
use intake_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use intake_common::Token;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Console only; warnings and errors unless --verbose
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("intake-cli")
        .filter_directives(if cli.verbose { "intake_cli=debug" } else { "warn" })
        .build();
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok().flatten();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> intake_cli::Result<()> {
    let client = ApiClient::new(cli.server_url.clone())?;
    let format = OutputFormat::from_json_flag(cli.json);

    match &cli.command {
        Commands::Invite => commands::invite::run(&client, format).await,
        Commands::List => commands::list::run(&client, format).await,
        Commands::Show { token } => {
            commands::show::run(&client, &Token::from(token.as_str()), format).await
        }
        Commands::Submit {
            token,
            fields,
            file,
        } => {
            commands::submit::run(
                &client,
                &Token::from(token.as_str()),
                file.as_deref(),
                fields,
                format,
            )
            .await
        }
        Commands::Audit { token } => {
            commands::audit::run(&client, &Token::from(token.as_str()), format).await
        }
        Commands::Health => commands::health::run(&client, format).await,
    }
}
