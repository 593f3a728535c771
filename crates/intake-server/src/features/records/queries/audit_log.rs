//! Field-level change history of one record

use crate::store::{Store, StoreResult};
use intake_common::{AuditEntry, Token};

#[derive(Debug, Clone)]
pub struct GetAuditLogQuery {
    pub token: Token,
}

/// Audit entries newest first. An unknown token is `NotFound`, a record
/// that was never edited yields an empty list.
#[tracing::instrument(skip(store, query), fields(token = %query.token))]
pub async fn handle(store: Store, query: GetAuditLogQuery) -> StoreResult<Vec<AuditEntry>> {
    store.audit_log(&query.token).await
}
