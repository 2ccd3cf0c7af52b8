use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use service_migration_shared::CanonicalDocument;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::errors::CanonicalStoreError;
use crate::interfaces::{CanonicalStore, DocumentFilter};

/// Canonical store held in process memory.
///
/// Counts every successful `upsert` so callers can assert that a re-sync
/// over unchanged data performed no writes.
#[derive(Debug, Default)]
pub struct InMemoryCanonicalStore {
    documents: Mutex<BTreeMap<Uuid, CanonicalDocument>>,
    writes: AtomicUsize,
}

impl InMemoryCanonicalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored document, in id order.
    pub fn documents(&self) -> Vec<CanonicalDocument> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CanonicalStore for InMemoryCanonicalStore {
    async fn get(&self, id: Uuid) -> Result<Option<CanonicalDocument>, CanonicalStoreError> {
        let documents = self
            .documents
            .lock()
            .map_err(|_| CanonicalStoreError::unavailable("in-memory store lock poisoned"))?;
        Ok(documents.get(&id).cloned())
    }

    async fn upsert(&self, document: &CanonicalDocument) -> Result<(), CanonicalStoreError> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| CanonicalStoreError::unavailable("in-memory store lock poisoned"))?;
        documents.insert(document.id, document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn iterate(
        &self,
        filter: DocumentFilter,
    ) -> BoxStream<'_, Result<CanonicalDocument, CanonicalStoreError>> {
        let snapshot: Vec<CanonicalDocument> = self
            .documents()
            .into_iter()
            .filter(|document| filter.matches(document))
            .collect();
        stream::iter(snapshot.into_iter().map(Ok)).boxed()
    }
}
