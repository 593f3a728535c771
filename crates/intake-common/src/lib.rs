//! Intake Common Library
//!
//! Types shared by the intake server and the admin CLI.
//!
//! # Overview
//!
//! - **Types**: tokens, field values, questionnaire records, audit entries and
//!   the overview projection, exactly as they travel over the wire
//! - **Errors**: the error kinds every API failure is reported with
//! - **Logging**: one place to configure `tracing` for every binary
//!
//! # Example
//!
//! ```
//! use intake_common::types::{FieldValue, Record, Token};
//!
//! let mut record = Record::new(Token::generate(), chrono::Utc::now());
//! record
//!     .fields
//!     .insert("firstName".to_string(), FieldValue::Text("Anna".to_string()));
//! assert_eq!(record.overview().first_name.as_deref(), Some("Anna"));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{ErrorDetail, ErrorKind, ErrorResponse};
pub use types::{AuditEntry, FieldValue, Invitation, Record, RecordOverview, Token};
