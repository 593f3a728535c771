//! HTTP API client for the intake server

use crate::api::{endpoints, types::HealthStatus};
use crate::error::{CliError, Result};
use intake_common::{AuditEntry, ErrorResponse, Invitation, Record, RecordOverview, Token};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Default timeout for API requests in seconds.
/// Can be overridden via INTAKE_API_TIMEOUT_SECS environment variable.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Default server URL when neither `--server-url` nor INTAKE_SERVER_URL is set.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// API client for the intake server
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let timeout_secs = std::env::var("INTAKE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check server health. A `503` still carries a status body.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = endpoints::health_url(&self.base_url);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::OK | StatusCode::SERVICE_UNAVAILABLE => Ok(response.json().await?),
            _ => Err(error_from(response).await),
        }
    }

    /// Issue a new invitation
    pub async fn issue_invitation(&self) -> Result<Invitation> {
        let url = endpoints::invitations_url(&self.base_url);
        decode(self.client.post(&url).send().await?).await
    }

    /// List the overview of every record
    pub async fn list_records(&self) -> Result<Vec<RecordOverview>> {
        let url = endpoints::records_url(&self.base_url);
        decode(self.client.get(&url).send().await?).await
    }

    pub async fn get_record(&self, token: &Token) -> Result<Record> {
        let url = endpoints::record_url(&self.base_url, token);
        decode(self.client.get(&url).send().await?).await
    }

    /// Submit field values for a record and return the stored result
    pub async fn submit(&self, token: &Token, fields: &Map<String, Value>) -> Result<Record> {
        let url = endpoints::record_url(&self.base_url, token);
        debug!(token = %token, fields = fields.len(), "Submitting record update");
        decode(self.client.put(&url).json(fields).send().await?).await
    }

    /// Fetch a record's audit log, newest first
    pub async fn audit_log(&self, token: &Token) -> Result<Vec<AuditEntry>> {
        let url = endpoints::audit_url(&self.base_url, token);
        decode(self.client.get(&url).send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(error_from(response).await)
    }
}

async fn error_from(response: Response) -> CliError {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return CliError::Http(e),
    };

    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => CliError::Api {
            kind: parsed.error.code,
            message: parsed.error.message,
        },
        Err(_) => CliError::UnexpectedStatus { status, body },
    }
}
