//! Token issuance
//!
//! A new token is a random UUID v4. The store rejects a token that already
//! exists, in which case a fresh one is drawn, up to a fixed number of
//! attempts. Any other failure is returned immediately.

use crate::store::{Store, StoreError, StoreResult};
use intake_common::{Record, Token};
use tracing::{info, warn};

pub const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Create an empty record under a freshly generated token.
pub async fn issue(store: &Store) -> StoreResult<Record> {
    let mut attempt = 1;
    loop {
        let token = Token::generate();
        match store.create(&token).await {
            Ok(record) => {
                info!(token = %record.token, attempt, "Issued token");
                return Ok(record);
            }
            Err(StoreError::DuplicateToken(taken)) if attempt < MAX_ISSUE_ATTEMPTS => {
                warn!(token = %taken, attempt, "Generated token already exists, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::FieldChanges;
    use crate::store::{MemoryRecordStore, RecordStore};
    use async_trait::async_trait;
    use intake_common::{AuditEntry, RecordOverview};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Reports the first `collisions` creates as duplicates.
    struct CollidingStore {
        inner: MemoryRecordStore,
        collisions: usize,
        attempts: AtomicUsize,
    }

    impl CollidingStore {
        fn new(collisions: usize) -> Self {
            Self {
                inner: MemoryRecordStore::new(),
                collisions,
                attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RecordStore for CollidingStore {
        fn backend(&self) -> &'static str {
            "colliding"
        }

        async fn health(&self) -> StoreResult<()> {
            Ok(())
        }

        async fn create(&self, token: &Token) -> StoreResult<Record> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) < self.collisions {
                return Err(StoreError::DuplicateToken(token.clone()));
            }
            self.inner.create(token).await
        }

        async fn get(&self, token: &Token) -> StoreResult<Record> {
            self.inner.get(token).await
        }

        async fn update(&self, token: &Token, changes: &FieldChanges) -> StoreResult<Record> {
            self.inner.update(token, changes).await
        }

        async fn list_overview(&self) -> StoreResult<Vec<RecordOverview>> {
            self.inner.list_overview().await
        }

        async fn audit_log(&self, token: &Token) -> StoreResult<Vec<AuditEntry>> {
            self.inner.audit_log(token).await
        }
    }

    fn store_with(backend: Arc<CollidingStore>) -> Store {
        Store::new(backend, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_issue_creates_empty_record() {
        let store = Store::in_memory();
        let record = issue(&store).await.unwrap();

        assert!(record.fields.is_empty());
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(store.get(&record.token).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_issue_retries_after_collision() {
        let backend = Arc::new(CollidingStore::new(2));
        let record = issue(&store_with(backend.clone())).await.unwrap();

        assert_eq!(backend.attempts.load(Ordering::SeqCst), 3);
        assert!(backend.inner.get(&record.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_issue_gives_up_after_max_attempts() {
        let backend = Arc::new(CollidingStore::new(usize::MAX));
        let err = issue(&store_with(backend.clone())).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicateToken(_)));
        assert_eq!(backend.attempts.load(Ordering::SeqCst), MAX_ISSUE_ATTEMPTS);
    }
}
