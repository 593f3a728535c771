//! Server-specific error types

use crate::features::records::commands::UpdateRecordError;
use crate::schema::FieldError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use intake_common::{ErrorKind, ErrorResponse};
use thiserror::Error;

/// Error returned by every handler
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error("Invalid record path: {0}")]
    InvalidPath(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Store(e) => e.kind(),
            AppError::Validation(_) | AppError::InvalidPath(_) => ErrorKind::ValidationError,
        }
    }
}

impl From<UpdateRecordError> for AppError {
    fn from(err: UpdateRecordError) -> Self {
        match err {
            UpdateRecordError::Validation(e) => AppError::Validation(e),
            UpdateRecordError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status =
            StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Backend details stay in the log
        let message = match kind {
            ErrorKind::StorageUnavailable => {
                tracing::error!(error = %self, "Storage error");
                "The record store is unavailable".to_string()
            }
            ErrorKind::Timeout => {
                tracing::error!(error = %self, "Storage timeout");
                "The record store did not respond in time".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse::new(kind, message))).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use intake_common::Token;
    use std::time::Duration;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, body) =
            body_of(StoreError::NotFound(Token::from("abc")).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Record 'abc' not found");
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let (status, body) = body_of(FieldError::UnknownField("x".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Unknown field 'x'");
    }

    #[tokio::test]
    async fn test_invalid_path_maps_to_400() {
        let (status, body) =
            body_of(AppError::InvalidPath("Invalid UTF-8 in `token`".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_storage_details_are_not_leaked() {
        let (status, body) =
            body_of(StoreError::ObjectStore("get secret/key: AccessDenied".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "STORAGE_UNAVAILABLE");
        assert!(!body["error"]["message"].as_str().unwrap().contains("secret"));

        let (status, body) = body_of(StoreError::Timeout(Duration::from_secs(10)).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "TIMEOUT");
    }
}
