//! Questionnaire records: read, update, list and audit trail

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{UpdateRecordCommand, UpdateRecordError};
pub use queries::{GetAuditLogQuery, GetRecordQuery, ListRecordsQuery};
pub use routes::records_routes;
