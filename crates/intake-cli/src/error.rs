//! Error types for the intake CLI
//!
//! Messages are shown to the operator as-is, so each one says what to check.

use intake_common::ErrorKind;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// The server answered with its standard error body
    #[error("{kind}: {message}")]
    Api { kind: ErrorKind, message: String },

    /// The server answered with something other than the standard error body
    #[error("Unexpected response ({status}) from server: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The server is reachable but its store is not
    #[error("Server at {url} is unhealthy (backend '{backend}'). Check the server logs.")]
    Unhealthy { url: String, backend: String },

    /// A `--field` argument or submission file could not be used
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// Submission file is missing
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check that the server is running and --server-url is correct.")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl CliError {
    pub fn invalid_submission(msg: impl Into<String>) -> Self {
        Self::InvalidSubmission(msg.into())
    }

    /// Error kind reported by the server, if the failure came from one.
    pub fn api_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
