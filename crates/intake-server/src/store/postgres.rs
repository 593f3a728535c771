//! PostgreSQL record store
//!
//! One row per record in `questionnaires`, with a typed column per field,
//! and one row per change in `questionnaire_audit_log`. An update locks the
//! record row, writes the changed columns and the audit rows, and commits
//! them in one transaction.

use super::diff::apply_changes;
use super::{now_micros, sort_overview, RecordStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::schema::{self, FieldChanges, FieldKind, DATE_FORMAT, FIELDS};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use intake_common::{AuditEntry, FieldValue, Record, RecordOverview, Token};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const AUDIT_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS questionnaire_audit_log (
    id UUID PRIMARY KEY,
    seq BIGSERIAL NOT NULL,
    record_token TEXT NOT NULL REFERENCES questionnaires (token) ON DELETE CASCADE,
    field_name TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    changed_at TIMESTAMPTZ NOT NULL
)"#;

const AUDIT_INDEX_SQL: &str = "CREATE INDEX IF NOT EXISTS idx_questionnaire_audit_log_token \
     ON questionnaire_audit_log (record_token, changed_at DESC)";

const UPDATED_AT_INDEX_SQL: &str = "CREATE INDEX IF NOT EXISTS idx_questionnaires_updated_at \
     ON questionnaires (updated_at DESC)";

pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await?;

        info!(
            max_connections = config.max_connections,
            "Database connection pool created"
        );

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `CREATE TABLE` for the record table, one column per schema field.
fn record_table_sql() -> String {
    let mut sql = String::from("CREATE TABLE IF NOT EXISTS questionnaires (\n    token TEXT PRIMARY KEY,\n");
    for def in FIELDS {
        sql.push_str(&format!("    {} {},\n", def.column, def.kind.sql_type()));
    }
    sql.push_str("    created_at TIMESTAMPTZ NOT NULL,\n    updated_at TIMESTAMPTZ NOT NULL\n)");
    sql
}

fn record_from_row(row: &PgRow) -> StoreResult<Record> {
    let mut fields = BTreeMap::new();

    for def in FIELDS {
        let value = match def.kind {
            FieldKind::Text => row
                .try_get::<Option<String>, _>(def.column)?
                .map(FieldValue::Text),
            FieldKind::Integer => row
                .try_get::<Option<i64>, _>(def.column)?
                .map(FieldValue::Integer),
            FieldKind::Boolean => row
                .try_get::<Option<bool>, _>(def.column)?
                .map(FieldValue::Boolean),
            FieldKind::Date => row
                .try_get::<Option<NaiveDate>, _>(def.column)?
                .map(|date| FieldValue::Text(date.format(DATE_FORMAT).to_string())),
        };
        if let Some(value) = value {
            fields.insert(def.name.to_string(), value);
        }
    }

    Ok(Record {
        token: Token::from(row.try_get::<String, _>("token")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        fields,
    })
}

/// Bind a field value with the SQL type of its column, NULL included.
fn push_field_value(
    set: &mut Separated<'_, '_, Postgres, &'static str>,
    kind: FieldKind,
    name: &str,
    value: Option<&FieldValue>,
) -> StoreResult<()> {
    let mismatch = || StoreError::Corrupt(format!("field '{}' holds a value of the wrong type", name));

    match kind {
        FieldKind::Text => {
            let text = value
                .map(|v| v.as_text().map(str::to_string).ok_or_else(mismatch))
                .transpose()?;
            set.push_bind_unseparated(text);
        }
        FieldKind::Integer => {
            let n = value
                .map(|v| v.as_integer().ok_or_else(mismatch))
                .transpose()?;
            set.push_bind_unseparated(n);
        }
        FieldKind::Boolean => {
            let b = value.map(|v| v.as_bool().ok_or_else(mismatch)).transpose()?;
            set.push_bind_unseparated(b);
        }
        FieldKind::Date => {
            let date = value
                .map(|v| {
                    v.as_text()
                        .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
                        .ok_or_else(mismatch)
                })
                .transpose()?;
            set.push_bind_unseparated(date);
        }
    }

    Ok(())
}

#[derive(FromRow)]
struct OverviewRow {
    token: String,
    first_name: Option<String>,
    last_name: Option<String>,
    age: Option<i64>,
    country: Option<String>,
    nationality: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OverviewRow> for RecordOverview {
    fn from(row: OverviewRow) -> Self {
        Self {
            token: Token::from(row.token),
            first_name: row.first_name,
            last_name: row.last_name,
            age: row.age,
            country: row.country,
            nationality: row.nationality,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: Uuid,
    record_token: String,
    field_name: String,
    old_value: Option<String>,
    new_value: Option<String>,
    changed_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        Self {
            id: row.id,
            token: Token::from(row.record_token),
            field_name: row.field_name,
            old_value: row.old_value,
            new_value: row.new_value,
            changed_at: row.changed_at,
        }
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self))]
    async fn init(&self) -> StoreResult<()> {
        sqlx::query(&record_table_sql()).execute(&self.pool).await?;
        sqlx::query(AUDIT_TABLE_SQL).execute(&self.pool).await?;
        sqlx::query(AUDIT_INDEX_SQL).execute(&self.pool).await?;
        sqlx::query(UPDATED_AT_INDEX_SQL).execute(&self.pool).await?;

        info!("Questionnaire tables ready");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn health(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(token = %token))]
    async fn create(&self, token: &Token) -> StoreResult<Record> {
        let now = now_micros();
        let result = sqlx::query(
            "INSERT INTO questionnaires (token, created_at, updated_at) VALUES ($1, $2, $2) \
             ON CONFLICT (token) DO NOTHING",
        )
        .bind(token.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateToken(token.clone()));
        }

        Ok(Record::new(token.clone(), now))
    }

    async fn get(&self, token: &Token) -> StoreResult<Record> {
        let row = sqlx::query("SELECT * FROM questionnaires WHERE token = $1")
            .bind(token.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(token.clone()))?;

        record_from_row(&row)
    }

    #[instrument(skip(self, token, changes), fields(token = %token, submitted = changes.len()))]
    async fn update(&self, token: &Token, changes: &FieldChanges) -> StoreResult<Record> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM questionnaires WHERE token = $1 FOR UPDATE")
            .bind(token.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(token.clone()))?;
        let mut record = record_from_row(&row)?;

        let entries = apply_changes(&mut record, changes, now_micros());
        if entries.is_empty() {
            tx.rollback().await?;
            return Ok(record);
        }

        let mut update = QueryBuilder::<Postgres>::new("UPDATE questionnaires SET ");
        {
            let mut set = update.separated(", ");
            for entry in &entries {
                let def = schema::field(&entry.field_name).ok_or_else(|| {
                    StoreError::Corrupt(format!("unknown field '{}'", entry.field_name))
                })?;
                set.push(def.column).push_unseparated(" = ");
                push_field_value(&mut set, def.kind, def.name, record.field(def.name))?;
            }
            set.push("updated_at = ").push_bind_unseparated(record.updated_at);
        }
        update.push(" WHERE token = ").push_bind(token.as_str());
        update.build().execute(&mut *tx).await?;

        let mut insert = QueryBuilder::<Postgres>::new(
            "INSERT INTO questionnaire_audit_log \
             (id, record_token, field_name, old_value, new_value, changed_at) ",
        );
        insert.push_values(&entries, |mut row, entry| {
            row.push_bind(entry.id)
                .push_bind(entry.token.as_str())
                .push_bind(entry.field_name.as_str())
                .push_bind(entry.old_value.clone())
                .push_bind(entry.new_value.clone())
                .push_bind(entry.changed_at);
        });
        insert.build().execute(&mut *tx).await?;

        tx.commit().await?;

        debug!(changed = entries.len(), "Record updated");
        Ok(record)
    }

    async fn list_overview(&self) -> StoreResult<Vec<RecordOverview>> {
        let rows: Vec<OverviewRow> = sqlx::query_as(
            "SELECT token, first_name, last_name, age, country, nationality, created_at, updated_at \
             FROM questionnaires ORDER BY updated_at DESC, token ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut overview: Vec<RecordOverview> = rows.into_iter().map(Into::into).collect();
        // Collation may order tokens differently from byte order
        sort_overview(&mut overview);
        Ok(overview)
    }

    async fn audit_log(&self, token: &Token) -> StoreResult<Vec<AuditEntry>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM questionnaires WHERE token = $1)")
                .bind(token.as_str())
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(StoreError::NotFound(token.clone()));
        }

        let rows: Vec<AuditRow> = sqlx::query_as(
            "SELECT id, record_token, field_name, old_value, new_value, changed_at \
             FROM questionnaire_audit_log WHERE record_token = $1 \
             ORDER BY changed_at DESC, seq DESC",
        )
        .bind(token.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
