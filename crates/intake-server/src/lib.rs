//! Intake Server Library
//!
//! HTTP service that stores questionnaire records addressed by an opaque
//! token and keeps a field-level audit trail of every change.
//!
//! # Overview
//!
//! - **Issuer**: hands out UUID v4 tokens, each backed by an empty record
//! - **Records**: partial updates validated against the field schema; every
//!   changed field is written to the audit trail in the same atomic step
//! - **Store**: one [`store::RecordStore`] contract with PostgreSQL,
//!   S3-compatible and in-memory backends, chosen by configuration
//! - **Middleware**: CORS, request tracing, compression and `no-store`
//!   caching headers
//!
//! # Example
//!
//! ```no_run
//! use intake_server::{api, config::Config, store};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = store::connect(&config).await?;
//!     store.init().await?;
//!     api::serve(config, store).await?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod issuer;
pub mod middleware;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use error::AppError;
pub use store::{Store, StoreError};
