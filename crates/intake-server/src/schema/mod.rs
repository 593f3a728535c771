//! Questionnaire field schema
//!
//! The field table is the single description of what a questionnaire may
//! hold. Validation of incoming changes, the Postgres column layout and the
//! audit trail's field names all derive from it.

mod fields;

pub use fields::FIELDS;

use chrono::{DateTime, NaiveDate};
use intake_common::FieldValue;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Format dates are stored and returned in.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper bound on the length of any free-text answer, in characters.
pub const MAX_TEXT_LENGTH: usize = 20_000;

/// Keys a client may echo back from a fetched record. They are ignored.
pub const METADATA_KEYS: [&str; 5] = ["token", "uniqueToken", "id", "createdAt", "updatedAt"];

/// A validated set of changes: `None` clears the field.
pub type FieldChanges = BTreeMap<String, Option<FieldValue>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
    /// Calendar date, carried as `YYYY-MM-DD` text
    Date,
}

impl FieldKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "BIGINT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Date => "date (YYYY-MM-DD)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Wire name (camelCase)
    pub name: &'static str,
    /// Postgres column name
    pub column: &'static str,
    pub kind: FieldKind,
    /// Inclusive range for integer fields
    pub bounds: Option<(i64, i64)>,
}

/// Look up a field by its wire name.
pub fn field(name: &str) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|def| def.name == name)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{field}' must be {expected}")]
    InvalidType {
        field: String,
        expected: FieldKind,
    },

    #[error("Field '{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        value: i64,
    },

    #[error("Field '{field}' must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("Field '{field}' must not contain NUL characters")]
    NulCharacter { field: String },
}

// ============================================================================
// Parsing
// ============================================================================

/// Validate a submitted JSON object into a set of changes.
///
/// Metadata keys are skipped. `null` and blank strings clear a field.
/// The first offending field fails the whole submission.
pub fn parse_changes(body: &Map<String, Value>) -> Result<FieldChanges, FieldError> {
    let mut changes = FieldChanges::new();

    for (name, value) in body {
        if METADATA_KEYS.contains(&name.as_str()) {
            continue;
        }
        let def = field(name).ok_or_else(|| FieldError::UnknownField(name.clone()))?;
        changes.insert(def.name.to_string(), coerce(def, value)?);
    }

    Ok(changes)
}

/// Convert one submitted JSON value into the field's stored form.
pub fn coerce(def: &FieldDef, value: &Value) -> Result<Option<FieldValue>, FieldError> {
    if is_blank(value) {
        return Ok(None);
    }

    let invalid = || FieldError::InvalidType {
        field: def.name.to_string(),
        expected: def.kind,
    };

    let coerced = match def.kind {
        FieldKind::Text => {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return Err(invalid()),
            };
            if text.chars().count() > MAX_TEXT_LENGTH {
                return Err(FieldError::TooLong {
                    field: def.name.to_string(),
                    max: MAX_TEXT_LENGTH,
                });
            }
            // Postgres TEXT cannot store 0x00
            if text.contains('\0') {
                return Err(FieldError::NulCharacter {
                    field: def.name.to_string(),
                });
            }
            FieldValue::Text(text)
        }
        FieldKind::Integer => {
            let n = match value {
                Value::Number(n) => n.as_i64().or_else(|| whole_number(n.as_f64()?)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(invalid)?;
            if let Some((min, max)) = def.bounds {
                if !(min..=max).contains(&n) {
                    return Err(FieldError::OutOfRange {
                        field: def.name.to_string(),
                        min,
                        max,
                        value: n,
                    });
                }
            }
            FieldValue::Integer(n)
        }
        FieldKind::Boolean => match value {
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => FieldValue::Boolean(true),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => {
                FieldValue::Boolean(false)
            }
            _ => return Err(invalid()),
        },
        FieldKind::Date => {
            let raw = value.as_str().ok_or_else(invalid)?;
            let date = parse_date(raw.trim()).ok_or_else(invalid)?;
            FieldValue::Text(date.format(DATE_FORMAT).to_string())
        }
    };

    Ok(Some(coerced))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn whole_number(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Accept a plain date or an RFC 3339 timestamp (the date part is kept).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
