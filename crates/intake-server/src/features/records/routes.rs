//! Record API routes
//!
//! - `GET /records` - Overview of all records
//! - `GET /records/:token` - Full record
//! - `PUT /records/:token` - Partial update
//! - `GET /records/:token/audit` - Change history, newest first

use crate::error::AppError;
use crate::schema::FieldError;
use crate::store::Store;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use intake_common::Token;
use serde_json::Value;

use super::{
    commands::{self, UpdateRecordCommand},
    queries::{self, GetAuditLogQuery, GetRecordQuery, ListRecordsQuery},
};

// ============================================================================
// Router Configuration
// ============================================================================

pub fn records_routes() -> Router<Store> {
    Router::new()
        .route("/", get(list_records))
        .route("/:token", get(get_record).put(update_record))
        .route("/:token/audit", get(get_audit_log))
}

/// The token segment must decode to a string; anything else is a client error.
fn token_from(path: Result<Path<String>, PathRejection>) -> Result<Token, AppError> {
    let Path(token) = path.map_err(|e| AppError::InvalidPath(e.body_text()))?;
    Ok(Token::from(token))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Update a record
///
/// # Request Body
///
/// ```json
/// { "firstName": "Anna", "age": 21, "city": null }
/// ```
///
/// # Response
///
/// - `200 OK` - The full record after the update
/// - `400 Bad Request` - Unknown field, wrong type, out of range or malformed body
/// - `404 Not Found` - No record for the token
/// - `500 Internal Server Error` - Storage unavailable or timed out
#[tracing::instrument(skip_all)]
async fn update_record(
    State(store): State<Store>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let token = token_from(path)?;
    let Json(body) = body.map_err(|e| FieldError::MalformedBody(e.body_text()))?;
    let command = UpdateRecordCommand::from_body(token, body)?;

    let record = commands::update::handle(store, command).await?;

    tracing::info!(token = %record.token, "Record updated via API");

    Ok(Json(record).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip_all)]
async fn get_record(
    State(store): State<Store>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let query = GetRecordQuery {
        token: token_from(path)?,
    };
    let record = queries::get::handle(store, query).await?;
    Ok(Json(record).into_response())
}

#[tracing::instrument(skip(store))]
async fn list_records(State(store): State<Store>) -> Result<Response, AppError> {
    let overview = queries::list::handle(store, ListRecordsQuery).await?;
    Ok(Json(overview).into_response())
}

#[tracing::instrument(skip_all)]
async fn get_audit_log(
    State(store): State<Store>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let query = GetAuditLogQuery {
        token: token_from(path)?,
    };
    let entries = queries::audit_log::handle(store, query).await?;
    Ok(Json(entries).into_response())
}
