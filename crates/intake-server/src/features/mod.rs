//! Feature modules implementing the intake API
//!
//! Each feature is a vertical slice:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//!
//! # Features
//!
//! - **invitations**: issue a token and its questionnaire link
//! - **records**: read, update and list records, and read their audit trail

pub mod invitations;
pub mod records;

use crate::store::Store;
use axum::Router;
use std::sync::Arc;

/// Shared state for feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub store: Store,
    /// Base of invitation links
    pub public_base_url: Arc<str>,
}

/// Mounts every feature under its own path prefix:
/// - `/invitations` - Token issuance
/// - `/records` - Record access and audit trail
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest(
            "/invitations",
            invitations::invitations_routes().with_state(state.clone()),
        )
        .nest("/records", records::records_routes().with_state(state.store))
}
