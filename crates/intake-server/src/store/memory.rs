//! Process-local record store
//!
//! Holds everything in a map behind a single lock, so every call is
//! trivially atomic. Data is lost on restart.

use super::diff::RecordDocument;
use super::{now_micros, sort_overview, RecordStore, StoreError, StoreResult};
use crate::schema::FieldChanges;
use async_trait::async_trait;
use intake_common::{AuditEntry, Record, RecordOverview, Token};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct MemoryRecordStore {
    documents: RwLock<HashMap<Token, RecordDocument>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create(&self, token: &Token) -> StoreResult<Record> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(token) {
            return Err(StoreError::DuplicateToken(token.clone()));
        }

        let record = Record::new(token.clone(), now_micros());
        documents.insert(token.clone(), RecordDocument::new(record.clone()));
        Ok(record)
    }

    async fn get(&self, token: &Token) -> StoreResult<Record> {
        self.documents
            .read()
            .await
            .get(token)
            .map(|doc| doc.record.clone())
            .ok_or_else(|| StoreError::NotFound(token.clone()))
    }

    async fn update(&self, token: &Token, changes: &FieldChanges) -> StoreResult<Record> {
        let mut documents = self.documents.write().await;
        let doc = documents
            .get_mut(token)
            .ok_or_else(|| StoreError::NotFound(token.clone()))?;

        let changed = doc.apply(changes, now_micros());
        debug!(token = %token, changed, "Applied changes in memory");
        Ok(doc.record.clone())
    }

    async fn list_overview(&self) -> StoreResult<Vec<RecordOverview>> {
        let documents = self.documents.read().await;
        let mut overview: Vec<RecordOverview> =
            documents.values().map(|doc| doc.record.overview()).collect();
        sort_overview(&mut overview);
        Ok(overview)
    }

    async fn audit_log(&self, token: &Token) -> StoreResult<Vec<AuditEntry>> {
        self.documents
            .read()
            .await
            .get(token)
            .map(RecordDocument::audit_newest_first)
            .ok_or_else(|| StoreError::NotFound(token.clone()))
    }
}
