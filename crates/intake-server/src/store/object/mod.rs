//! S3-compatible record store
//!
//! Each record lives in its own JSON document at
//! `{prefix}records/{token}.json`, together with its audit trail, so one
//! object write updates both atomically. Writes are conditional: creation
//! requires the key to be absent and updates require the ETag read
//! beforehand, retrying the read-modify-write when another writer got there
//! first.

use super::diff::RecordDocument;
use super::{now_micros, sort_overview, RecordStore, StoreError, StoreResult};
use crate::schema::FieldChanges;
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    Client,
};
use futures::{StreamExt, TryStreamExt};
use intake_common::{AuditEntry, Record, RecordOverview, Token};
use tracing::{debug, info, instrument, warn};

pub mod config;

use config::ObjectStoreConfig;

const RECORDS_DIR: &str = "records/";

const DOCUMENT_SUFFIX: &str = ".json";

/// Attempts at a conditional update before giving up on a contended record.
const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Documents fetched in parallel while building the overview.
const LIST_CONCURRENCY: usize = 16;

#[derive(Clone)]
pub struct ObjectRecordStore {
    client: Client,
    bucket: String,
    prefix: String,
}

enum WriteCondition {
    /// The key must not exist yet
    Absent,
    /// The object must still carry this ETag
    Unchanged(String),
}

impl ObjectRecordStore {
    pub fn new(config: &ObjectStoreConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "intake-object-store",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            bucket = %config.bucket,
            prefix = %config.prefix,
            "Object store client initialized"
        );

        Self {
            client,
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
        }
    }

    fn records_prefix(&self) -> String {
        format!("{}{}", self.prefix, RECORDS_DIR)
    }

    fn key(&self, token: &Token) -> String {
        format!("{}{}{}", self.records_prefix(), token, DOCUMENT_SUFFIX)
    }

    /// Read a document and its ETag. `None` when the key does not exist.
    async fn fetch(&self, key: &str) -> StoreResult<Option<(RecordDocument, Option<String>)>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Ok(None)
            }
            Err(err) => return Err(object_error("get", key, err)),
        };

        let etag = output.e_tag().map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::ObjectStore(format!("reading {}: {}", key, e)))?
            .into_bytes();

        let document: RecordDocument = serde_json::from_slice(&bytes)?;
        Ok(Some((document, etag)))
    }

    /// Write a document under a condition. Returns `false` when the
    /// condition no longer holds.
    async fn put(
        &self,
        key: &str,
        document: &RecordDocument,
        condition: WriteCondition,
    ) -> StoreResult<bool> {
        let body = serde_json::to_vec(document)?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(body));

        request = match condition {
            WriteCondition::Absent => request.if_none_match("*"),
            WriteCondition::Unchanged(etag) => request.if_match(etag),
        };

        match request.send().await {
            Ok(_) => Ok(true),
            Err(err) if is_precondition_failure(&err) => Ok(false),
            Err(err) => Err(object_error("put", key, err)),
        }
    }

    async fn list_keys(&self) -> StoreResult<Vec<String>> {
        let prefix = self.records_prefix();
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|err| object_error("list", &prefix, err))?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| key.ends_with(DOCUMENT_SUFFIX))
                    .map(str::to_string),
            );

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string())
                }
                _ => break,
            }
        }

        Ok(keys)
    }
}

fn is_precondition_failure<E, R>(err: &SdkError<E, R>) -> bool
where
    E: ProvideErrorMetadata,
{
    let code = err.as_service_error().and_then(|e| e.code());
    matches!(
        code,
        Some("PreconditionFailed") | Some("ConditionalRequestConflict")
    )
}

fn object_error<E, R>(operation: &str, key: &str, err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + 'static,
{
    StoreError::ObjectStore(format!(
        "{} {}: {}",
        operation,
        key,
        DisplayErrorContext(&err)
    ))
}

#[async_trait]
impl RecordStore for ObjectRecordStore {
    fn backend(&self) -> &'static str {
        "object"
    }

    #[instrument(skip(self))]
    async fn init(&self) -> StoreResult<()> {
        self.health().await?;
        info!(bucket = %self.bucket, "Object store bucket reachable");
        Ok(())
    }

    async fn health(&self) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|err| object_error("head", &self.bucket, err))?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(token = %token))]
    async fn create(&self, token: &Token) -> StoreResult<Record> {
        let record = Record::new(token.clone(), now_micros());
        let document = RecordDocument::new(record.clone());

        if !self.put(&self.key(token), &document, WriteCondition::Absent).await? {
            return Err(StoreError::DuplicateToken(token.clone()));
        }

        Ok(record)
    }

    async fn get(&self, token: &Token) -> StoreResult<Record> {
        self.fetch(&self.key(token))
            .await?
            .map(|(document, _)| document.record)
            .ok_or_else(|| StoreError::NotFound(token.clone()))
    }

    #[instrument(skip(self, token, changes), fields(token = %token, submitted = changes.len()))]
    async fn update(&self, token: &Token, changes: &FieldChanges) -> StoreResult<Record> {
        let key = self.key(token);

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let (mut document, etag) = self
                .fetch(&key)
                .await?
                .ok_or_else(|| StoreError::NotFound(token.clone()))?;

            let changed = document.apply(changes, now_micros());
            if changed == 0 {
                return Ok(document.record);
            }

            let etag = etag.ok_or_else(|| {
                StoreError::ObjectStore(format!("get {}: response carried no ETag", key))
            })?;

            if self.put(&key, &document, WriteCondition::Unchanged(etag)).await? {
                debug!(changed, attempt, "Record document written");
                return Ok(document.record);
            }

            warn!(attempt, "Record document changed concurrently, retrying");
        }

        Err(StoreError::ObjectStore(format!(
            "put {}: gave up after {} conflicting writes",
            key, MAX_UPDATE_ATTEMPTS
        )))
    }

    async fn list_overview(&self) -> StoreResult<Vec<RecordOverview>> {
        let keys = self.list_keys().await?;

        let documents: Vec<Option<(RecordDocument, Option<String>)>> =
            futures::stream::iter(keys)
                .map(|key| async move { self.fetch(&key).await })
                .buffer_unordered(LIST_CONCURRENCY)
                .try_collect()
                .await?;

        // A document deleted between listing and fetching is skipped
        let mut overview: Vec<RecordOverview> = documents
            .into_iter()
            .flatten()
            .map(|(document, _)| document.record.overview())
            .collect();
        sort_overview(&mut overview);
        Ok(overview)
    }

    async fn audit_log(&self, token: &Token) -> StoreResult<Vec<AuditEntry>> {
        self.fetch(&self.key(token))
            .await?
            .map(|(document, _)| document.audit_newest_first())
            .ok_or_else(|| StoreError::NotFound(token.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(prefix: &str) -> ObjectRecordStore {
        let mut config = ObjectStoreConfig::for_minio("http://localhost:9000", "intake-test");
        config.prefix = config::normalize_prefix(prefix);
        ObjectRecordStore::new(&config)
    }

    #[test]
    fn test_keys_are_namespaced_by_prefix() {
        let token = Token::from("3f1c2a9e-0000-4000-8000-000000000001");
        assert_eq!(
            store("").key(&token),
            "records/3f1c2a9e-0000-4000-8000-000000000001.json"
        );
        assert_eq!(
            store("staging").key(&token),
            "staging/records/3f1c2a9e-0000-4000-8000-000000000001.json"
        );
    }

    #[test]
    fn test_document_layout() {
        let mut document = RecordDocument::new(Record::new(Token::from("t"), now_micros()));
        document.apply(
            &FieldChanges::from([(
                "firstName".to_string(),
                Some(intake_common::FieldValue::Text("Anna".into())),
            )]),
            now_micros(),
        );

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["record"]["firstName"], "Anna");
        assert_eq!(json["audit"][0]["fieldName"], "firstName");

        let back: RecordDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, document);
    }
}
