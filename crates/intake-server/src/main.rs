//! Intake Server - Main entry point

use anyhow::Result;
use intake_common::logging::{init_logging, LogConfig};
use intake_server::{api, config::Config, store};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("intake-server")
        .filter_directives("intake_server=debug,tower_http=debug,sqlx=info")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    info!("Starting intake server");

    let config = Config::load()?;
    info!(
        backend = %config.store.backend,
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let store = store::connect(&config).await?;
    store.init().await?;

    let result = api::serve(config, store.clone()).await;

    store.close().await;
    info!("Record store closed");

    result
}
