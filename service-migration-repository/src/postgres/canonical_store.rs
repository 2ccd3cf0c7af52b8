//! PostgreSQL canonical document store.
//!
//! ## Database Tables
//!
//! - `canonical_documents`: one JSONB document per `(id, record_kind)`

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use service_migration_shared::{CanonicalDocument, EntityKind, RECORD_KIND_DOCUMENT};
use uuid::Uuid;

use crate::errors::CanonicalStoreError;
use crate::interfaces::{CanonicalStore, DocumentFilter};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    record_kind: String,
    entity_kind: String,
    document: serde_json::Value,
}

impl TryFrom<DocumentRow> for CanonicalDocument {
    type Error = CanonicalStoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let entity_kind = EntityKind::parse(&row.entity_kind)
            .ok_or(CanonicalStoreError::UnknownEntityKind(row.entity_kind))?;
        Ok(CanonicalDocument {
            id: row.id,
            record_kind: row.record_kind,
            entity_kind,
            document: row.document,
        })
    }
}

/// Canonical store backed by the `canonical_documents` table.
pub struct PostgresCanonicalStore {
    pool: sqlx::PgPool,
}

impl PostgresCanonicalStore {
    /// Creates a store over a pool whose schema has been migrated.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CanonicalStore for PostgresCanonicalStore {
    async fn get(&self, id: Uuid) -> Result<Option<CanonicalDocument>, CanonicalStoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, record_kind, entity_kind, document FROM canonical_documents \
             WHERE id = $1 AND record_kind = $2",
        )
        .bind(id)
        .bind(RECORD_KIND_DOCUMENT)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CanonicalDocument::try_from).transpose()
    }

    /// Create-or-replace keyed by `(id, record_kind)`.
    async fn upsert(&self, document: &CanonicalDocument) -> Result<(), CanonicalStoreError> {
        sqlx::query(
            "INSERT INTO canonical_documents (id, record_kind, entity_kind, document, updated_at) \
             VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (id, record_kind) DO UPDATE SET \
                 entity_kind = EXCLUDED.entity_kind, \
                 document = EXCLUDED.document, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(document.id)
        .bind(&document.record_kind)
        .bind(document.entity_kind.as_str())
        .bind(&document.document)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn iterate(
        &self,
        filter: DocumentFilter,
    ) -> BoxStream<'_, Result<CanonicalDocument, CanonicalStoreError>> {
        let entity_kind = filter.entity_kind.map(|kind| kind.as_str());
        sqlx::query_as::<_, DocumentRow>(
            "SELECT id, record_kind, entity_kind, document FROM canonical_documents \
             WHERE record_kind = $1 AND ($2::text IS NULL OR entity_kind = $2) \
             ORDER BY id",
        )
        .bind(RECORD_KIND_DOCUMENT)
        .bind(entity_kind)
        .fetch(&self.pool)
        .map(|row| {
            row.map_err(CanonicalStoreError::from)
                .and_then(CanonicalDocument::try_from)
        })
        .boxed()
    }
}
