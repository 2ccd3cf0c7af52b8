//! Durable key-document store holding migrated entities.

use async_trait::async_trait;
use futures::stream::BoxStream;
use service_migration_shared::{CanonicalDocument, EntityKind};
use uuid::Uuid;

use crate::errors::CanonicalStoreError;

/// Restricts which documents `iterate` yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub entity_kind: Option<EntityKind>,
}

impl DocumentFilter {
    pub fn kind(entity_kind: EntityKind) -> Self {
        Self {
            entity_kind: Some(entity_kind),
        }
    }

    pub fn matches(&self, document: &CanonicalDocument) -> bool {
        self.entity_kind
            .map_or(true, |kind| kind == document.entity_kind)
    }
}

/// Canonical document store keyed by `(id, record_kind)`.
///
/// Implementations must tolerate concurrent writers. `upsert` is
/// create-or-replace, so writing identical content twice leaves the store
/// unchanged.
#[async_trait]
pub trait CanonicalStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<CanonicalDocument>, CanonicalStoreError>;

    async fn upsert(&self, document: &CanonicalDocument) -> Result<(), CanonicalStoreError>;

    /// Lazily stream every document matching `filter`, in id order.
    ///
    /// Each call starts a fresh scan, so the sequence can be restarted by
    /// calling `iterate` again.
    fn iterate(
        &self,
        filter: DocumentFilter,
    ) -> BoxStream<'_, Result<CanonicalDocument, CanonicalStoreError>>;
}
