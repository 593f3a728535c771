//! Update record command
//!
//! Applies a partial set of field changes to one record. Fields left out of
//! the submission keep their stored value; `null` or a blank string clears a
//! field. Every field whose value actually changes gets one audit entry.

use crate::schema::{self, FieldChanges, FieldError};
use crate::store::{Store, StoreError};
use intake_common::{Record, Token};
use serde_json::{Map, Value};

/// Command to update the fields of an existing record
///
/// # Examples
///
/// ```rust,ignore
/// use intake_server::features::records::UpdateRecordCommand;
///
/// let command = UpdateRecordCommand {
///     token: Token::from("3f1c2a9e-..."),
///     fields: serde_json::json!({ "firstName": "Anna", "age": 21 })
///         .as_object()
///         .cloned()
///         .unwrap_or_default(),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct UpdateRecordCommand {
    pub token: Token,
    pub fields: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateRecordError {
    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UpdateRecordCommand {
    /// Build a command from a raw request body, which must be a JSON object.
    pub fn from_body(token: Token, body: Value) -> Result<Self, UpdateRecordError> {
        match body {
            Value::Object(fields) => Ok(Self { token, fields }),
            _ => Err(FieldError::NotAnObject.into()),
        }
    }

    /// Validate every submitted field.
    ///
    /// # Errors
    ///
    /// - `UnknownField` - The name is not part of the questionnaire
    /// - `InvalidType` - The value cannot be read as the field's kind
    /// - `OutOfRange` - An integer falls outside its allowed range
    /// - `TooLong` - Free text exceeds the length limit
    pub fn validate(&self) -> Result<FieldChanges, UpdateRecordError> {
        Ok(schema::parse_changes(&self.fields)?)
    }
}

/// Handles the update record command
///
/// Nothing is written when validation fails. An empty or no-op submission
/// returns the stored record unchanged.
#[tracing::instrument(skip(store, command), fields(token = %command.token))]
pub async fn handle(store: Store, command: UpdateRecordCommand) -> Result<Record, UpdateRecordError> {
    let changes = command.validate()?;
    let record = store.update(&command.token, &changes).await?;

    tracing::debug!(submitted = changes.len(), "Record update applied");

    Ok(record)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::issuer;
    use intake_common::FieldValue;
    use serde_json::json;

    fn command(token: &Token, body: Value) -> UpdateRecordCommand {
        UpdateRecordCommand::from_body(token.clone(), body).unwrap()
    }

    #[test]
    fn test_body_must_be_an_object() {
        let err = UpdateRecordCommand::from_body(Token::from("t"), json!(["age", 21])).unwrap_err();
        assert!(matches!(err, UpdateRecordError::Validation(FieldError::NotAnObject)));
    }

    #[tokio::test]
    async fn test_handle_applies_changes() {
        let store = Store::in_memory();
        let token = issuer::issue(&store).await.unwrap().token;

        let record = handle(store.clone(), command(&token, json!({ "firstName": "Anna", "age": "21" })))
            .await
            .unwrap();

        assert_eq!(record.field("age"), Some(&FieldValue::Integer(21)));
        assert_eq!(store.audit_log(&token).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_submission_writes_nothing() {
        let store = Store::in_memory();
        let before = issuer::issue(&store).await.unwrap();

        let err = handle(
            store.clone(),
            command(&before.token, json!({ "firstName": "Anna", "age": 120 })),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            UpdateRecordError::Validation(FieldError::OutOfRange { .. })
        ));
        assert_eq!(store.get(&before.token).await.unwrap(), before);
        assert!(store.audit_log(&before.token).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let store = Store::in_memory();
        let err = handle(store, command(&Token::from("nope"), json!({ "city": "Kutaisi" })))
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateRecordError::Store(StoreError::NotFound(_))));
    }
}
