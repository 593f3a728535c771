pub mod audit_log;
pub mod get;
pub mod list;

pub use audit_log::GetAuditLogQuery;
pub use get::GetRecordQuery;
pub use list::ListRecordsQuery;
