//! PostgreSQL version-history sink.
//!
//! ## Database Tables
//!
//! - `version_history`: insert-only, keyed by `(entity_id, "timestamp")`

use async_trait::async_trait;
use service_migration_shared::VersionHistoryRecord;
use sqlx::types::Json;

use crate::errors::AuditSinkError;
use crate::interfaces::AuditSink;

pub struct PostgresAuditSink {
    pool: sqlx::PgPool,
}

impl PostgresAuditSink {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn append(&self, record: &VersionHistoryRecord) -> Result<(), AuditSinkError> {
        let result = sqlx::query(
            "INSERT INTO version_history (entity_id, \"timestamp\", change_type, changed_fields, changed_by) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&record.entity_id)
        .bind(&record.timestamp)
        .bind(record.change_type.as_str())
        .bind(Json(&record.changed_fields))
        .bind(Json(&record.changed_by))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                Err(AuditSinkError::DuplicateEntry {
                    entity_id: record.entity_id.clone(),
                    timestamp: record.timestamp.clone(),
                })
            }
            Err(e) => Err(AuditSinkError::DatabaseError(e)),
        }
    }
}
