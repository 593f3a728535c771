//! Change application shared by the document-oriented backends
//!
//! The memory and object stores hold a record together with its audit
//! trail as one [`RecordDocument`]. The Postgres store reuses
//! [`apply_changes`] inside its transaction.

use crate::schema::FieldChanges;
use chrono::{DateTime, Duration, Utc};
use intake_common::{AuditEntry, FieldValue, Record};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A record and every audit entry ever written for it, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDocument {
    pub record: Record,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
}

impl RecordDocument {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            audit: Vec::new(),
        }
    }

    /// Apply changes and append the resulting audit entries.
    /// Returns how many fields actually changed.
    pub fn apply(&mut self, changes: &FieldChanges, now: DateTime<Utc>) -> usize {
        let entries = apply_changes(&mut self.record, changes, now);
        let changed = entries.len();
        self.audit.extend(entries);
        changed
    }

    pub fn audit_newest_first(&self) -> Vec<AuditEntry> {
        self.audit.iter().rev().cloned().collect()
    }
}

/// Apply `changes` to `record`, returning one audit entry per field whose
/// value differs from what was stored.
///
/// When nothing differs the record, including `updated_at`, is untouched.
/// Otherwise `updated_at` advances to `now` (or one microsecond past the
/// previous value if the clock has not moved) and every entry carries that
/// same timestamp.
pub fn apply_changes(
    record: &mut Record,
    changes: &FieldChanges,
    now: DateTime<Utc>,
) -> Vec<AuditEntry> {
    let changed_at = next_timestamp(record.updated_at, now);
    let mut entries = Vec::new();

    for (name, new_value) in changes {
        let old_value = record.fields.get(name);
        if same_value(old_value, new_value.as_ref()) {
            continue;
        }

        entries.push(AuditEntry {
            id: Uuid::new_v4(),
            token: record.token.clone(),
            field_name: name.clone(),
            old_value: old_value.map(FieldValue::to_string),
            new_value: new_value.as_ref().map(FieldValue::to_string),
            changed_at,
        });

        match new_value {
            Some(value) => record.fields.insert(name.clone(), value.clone()),
            None => record.fields.remove(name),
        };
    }

    if !entries.is_empty() {
        record.updated_at = changed_at;
    }

    entries
}

/// Numbers compare numerically, strings exactly, absent equals absent.
fn same_value(old: Option<&FieldValue>, new: Option<&FieldValue>) -> bool {
    match (old, new) {
        (None, None) => true,
        (Some(FieldValue::Integer(a)), Some(FieldValue::Integer(b))) => a == b,
        (Some(FieldValue::Integer(n)), Some(FieldValue::Text(s)))
        | (Some(FieldValue::Text(s)), Some(FieldValue::Integer(n))) => {
            s.trim().parse::<i64>().is_ok_and(|parsed| parsed == *n)
        }
        (Some(FieldValue::Text(a)), Some(FieldValue::Text(b))) => a == b,
        (Some(FieldValue::Boolean(a)), Some(FieldValue::Boolean(b))) => a == b,
        _ => false,
    }
}

fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
