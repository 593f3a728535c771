//! Error kinds reported by the intake API

use serde::{Deserialize, Serialize};

/// Machine-readable failure category carried by every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No record exists for the token
    NotFound,
    /// A freshly generated token collided with an existing record
    DuplicateToken,
    /// A submitted field failed its type or range check
    ValidationError,
    /// The backing store is unreachable or returned an error
    StorageUnavailable,
    /// The backing store did not answer within the configured bound
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::DuplicateToken => "DUPLICATE_TOKEN",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::Timeout => "TIMEOUT",
        }
    }

    /// HTTP status code the kind is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::DuplicateToken | Self::ValidationError => 400,
            Self::StorageUnavailable | Self::Timeout => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard error response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: ErrorKind,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code,
                message: message.into(),
            },
        }
    }
}
