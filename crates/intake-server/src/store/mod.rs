//! Record storage
//!
//! Every backend implements [`RecordStore`]. Handlers never see a backend
//! directly: they go through [`Store`], which bounds each call with the
//! configured timeout and logs failures in one place.
//!
//! Backends:
//!
//! - [`postgres::PostgresRecordStore`]: relational tables, one row per record
//! - [`object::ObjectRecordStore`]: one JSON document per record in S3
//! - [`memory::MemoryRecordStore`]: process-local, for tests and demos

use crate::config::Config;
use crate::schema::FieldChanges;
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use intake_common::{AuditEntry, ErrorKind, Record, RecordOverview, Token};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub mod diff;
pub mod memory;
pub mod object;
pub mod postgres;

pub use memory::MemoryRecordStore;
pub use object::ObjectRecordStore;
pub use postgres::PostgresRecordStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record '{0}' not found")]
    NotFound(Token),

    #[error("Token '{0}' is already in use")]
    DuplicateToken(Token),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Stored document is unreadable: {0}")]
    Corrupt(String),

    #[error("Storage call did not complete within {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DuplicateToken(_) => ErrorKind::DuplicateToken,
            Self::Timeout(_) | Self::Database(sqlx::Error::PoolTimedOut) => ErrorKind::Timeout,
            Self::Database(_) | Self::ObjectStore(_) | Self::Corrupt(_) => {
                ErrorKind::StorageUnavailable
            }
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// Persistence contract shared by every backend.
///
/// Implementations must keep each `update` atomic per record: the field
/// changes, the new `updated_at` and the audit entries become visible
/// together or not at all.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Prepare tables or buckets. Safe to call repeatedly.
    async fn init(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Release pooled connections.
    async fn close(&self) {}

    async fn health(&self) -> StoreResult<()>;

    /// Create an empty record. Fails with `DuplicateToken` if the token exists.
    async fn create(&self, token: &Token) -> StoreResult<Record>;

    async fn get(&self, token: &Token) -> StoreResult<Record>;

    /// Apply changes and append one audit entry per field whose value differs.
    async fn update(&self, token: &Token, changes: &FieldChanges) -> StoreResult<Record>;

    /// All records, most recently updated first.
    async fn list_overview(&self) -> StoreResult<Vec<RecordOverview>>;

    /// Audit entries for one record, newest first.
    async fn audit_log(&self, token: &Token) -> StoreResult<Vec<AuditEntry>>;
}

/// Most recently updated first; ties broken by token for a stable listing.
pub(crate) fn sort_overview(overview: &mut [RecordOverview]) {
    overview.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.token.cmp(&b.token))
    });
}

/// Current time at the precision every backend can store.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ============================================================================
// Store handle
// ============================================================================

/// Shared, cheaply cloneable handle to the configured backend.
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl Store {
    pub fn new(inner: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryRecordStore::new()),
            Duration::from_secs(crate::config::DEFAULT_STORE_TIMEOUT_SECS),
        )
    }

    pub fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        };

        if let Err(ref err) = result {
            if err.kind().status_code() >= 500 {
                warn!(
                    backend = self.backend(),
                    operation,
                    error = %err,
                    "Storage call failed"
                );
            }
        }

        result
    }

    pub async fn init(&self) -> StoreResult<()> {
        self.bounded("init", self.inner.init()).await
    }

    pub async fn close(&self) {
        self.inner.close().await
    }

    pub async fn health(&self) -> StoreResult<()> {
        self.bounded("health", self.inner.health()).await
    }

    pub async fn create(&self, token: &Token) -> StoreResult<Record> {
        self.bounded("create", self.inner.create(token)).await
    }

    pub async fn get(&self, token: &Token) -> StoreResult<Record> {
        self.bounded("get", self.inner.get(token)).await
    }

    pub async fn update(&self, token: &Token, changes: &FieldChanges) -> StoreResult<Record> {
        self.bounded("update", self.inner.update(token, changes)).await
    }

    pub async fn list_overview(&self) -> StoreResult<Vec<RecordOverview>> {
        self.bounded("list_overview", self.inner.list_overview()).await
    }

    pub async fn audit_log(&self, token: &Token) -> StoreResult<Vec<AuditEntry>> {
        self.bounded("audit_log", self.inner.audit_log(token)).await
    }
}

/// Which backend a deployment persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Object,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "object" | "s3" => Ok(Self::Object),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown store backend '{}' (expected postgres, object or memory)",
                other
            )),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Postgres => "postgres",
            Self::Object => "object",
            Self::Memory => "memory",
        })
    }
}

/// Build the backend selected by configuration.
pub async fn connect(config: &Config) -> anyhow::Result<Store> {
    let inner: Arc<dyn RecordStore> = match config.store.backend {
        StoreBackend::Postgres => Arc::new(PostgresRecordStore::connect(&config.database).await?),
        StoreBackend::Object => Arc::new(ObjectRecordStore::new(&config.object_store)),
        StoreBackend::Memory => Arc::new(MemoryRecordStore::new()),
    };

    info!(backend = inner.backend(), "Record store ready");

    Ok(Store::new(
        inner,
        Duration::from_secs(config.store.timeout_secs),
    ))
}
