//! HTTP surface: router assembly, health check and the serve loop

use crate::config::Config;
use crate::features::{self, FeatureState};
use crate::middleware;
use crate::store::Store;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::{signal, sync::watch};
use tower_http::compression::CompressionLayer;
use tracing::{info, warn};

/// Build the application router with all routes and middleware.
pub fn create_router(store: Store, config: &Config) -> Router {
    let feature_state = FeatureState {
        store: store.clone(),
        public_base_url: config.invitations.public_base_url.as_str().into(),
    };

    Router::new()
        .route("/health", get(health_check))
        .with_state(store)
        .merge(features::router(feature_state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::no_store_layer())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Health check handler
///
/// `200` with the backend name when the store answers, `503` otherwise.
async fn health_check(State(store): State<Store>) -> Response {
    match store.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "backend": store.backend(),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "backend": store.backend(),
                    "error": e.kind(),
                })),
            )
                .into_response()
        }
    }
}

/// Bind and serve until a shutdown signal arrives.
///
/// In-flight requests get `shutdown_timeout_secs` to finish once the signal
/// is received.
pub async fn serve(config: Config, store: Store) -> anyhow::Result<()> {
    let app = create_router(store, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let (stopping_tx, mut stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stopping_tx.send(true);
        })
        .into_future();

    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    let deadline = async move {
        if stopping_rx.wait_for(|stopping| *stopping).await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result?,
        _ = deadline => {
            warn!("Connections still open after {:?}, shutting down anyway", grace);
        }
    }

    info!("Server shut down");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
