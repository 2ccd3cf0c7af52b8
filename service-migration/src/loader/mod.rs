//! Loader module for the migration pipeline.
//!
//! Writes transformed entities to the canonical store. A write is skipped when
//! the stored document already carries the same business content, so
//! re-syncing unchanged legacy data leaves the store untouched.

use serde_json::Value;
use service_migration_repository::{CanonicalStore, CanonicalStoreError};
use service_migration_shared::CanonicalDocument;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::errors::SyncError;
use crate::transformer::TransformationResult;

/// Bookkeeping fields refreshed on every transform; ignored when comparing.
const VOLATILE_FIELDS: [&str; 2] = ["createdTime", "lastUpdated"];

/// Creation fields carried over from the stored document on replace.
const CREATION_FIELDS: [&str; 2] = ["createdBy", "createdTime"];

/// What the loader did with one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Created,
    Replaced,
    Unchanged,
}

/// Summary of one `load` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub created: usize,
    pub replaced: usize,
    pub unchanged: usize,
}

impl LoadSummary {
    fn record(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Created => self.created += 1,
            LoadOutcome::Replaced => self.replaced += 1,
            LoadOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Upserts canonical entities by their deterministic id.
pub struct CanonicalLoader {
    store: Arc<dyn CanonicalStore>,
}

impl CanonicalLoader {
    pub fn new(store: Arc<dyn CanonicalStore>) -> Self {
        Self { store }
    }

    /// Write every entity in the result: organisation, location, then service.
    #[instrument(skip(self, result))]
    pub async fn load(&self, result: &TransformationResult) -> Result<LoadSummary, SyncError> {
        let mut summary = LoadSummary::default();
        for entity in result.entities() {
            let document = entity.to_document().map_err(CanonicalStoreError::from)?;
            summary.record(self.upsert(document).await?);
        }
        Ok(summary)
    }

    async fn upsert(&self, mut document: CanonicalDocument) -> Result<LoadOutcome, SyncError> {
        let Some(existing) = self.store.get(document.id).await? else {
            self.store.upsert(&document).await?;
            debug!(id = %document.id, kind = document.entity_kind.as_str(), "Created document");
            return Ok(LoadOutcome::Created);
        };

        if without_volatile_fields(&existing.document) == without_volatile_fields(&document.document) {
            debug!(id = %document.id, "Document unchanged, skipping write");
            return Ok(LoadOutcome::Unchanged);
        }

        if let (Value::Object(stored), Value::Object(fresh)) =
            (&existing.document, &mut document.document)
        {
            for field in CREATION_FIELDS {
                if let Some(value) = stored.get(field) {
                    fresh.insert(field.to_string(), value.clone());
                }
            }
        }

        self.store.upsert(&document).await?;
        debug!(id = %document.id, kind = document.entity_kind.as_str(), "Replaced document");
        Ok(LoadOutcome::Replaced)
    }
}

fn without_volatile_fields(document: &Value) -> Value {
    let mut document = document.clone();
    if let Value::Object(fields) = &mut document {
        for field in VOLATILE_FIELDS {
            fields.remove(field);
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use service_migration_repository::InMemoryCanonicalStore;
    use service_migration_shared::{
        AuditMetadata, HealthcareService, HealthcareServiceCategory, HealthcareServiceType,
    };
    use uuid::Uuid;

    fn service(name: &str, at: chrono::DateTime<Utc>) -> HealthcareService {
        HealthcareService {
            audit: AuditMetadata::migration(at),
            id: Uuid::from_u128(9),
            identifier_old_dos_uid: "9".to_string(),
            active: true,
            category: HealthcareServiceCategory::GpServices,
            service_type: HealthcareServiceType::GpConsultationService,
            provided_by: None,
            location: None,
            name: name.to_string(),
            telecom: None,
            opening_time: vec![],
            symptom_group_symptom_discriminators: vec![],
            dispositions: vec![],
            age_eligibility_criteria: None,
        }
    }

    fn result(service: HealthcareService) -> TransformationResult {
        TransformationResult {
            healthcare_service: Some(service),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unchanged_content_is_not_rewritten() {
        let store = Arc::new(InMemoryCanonicalStore::new());
        let loader = CanonicalLoader::new(store.clone());
        let first_run = Utc::now();

        let summary = loader.load(&result(service("GP", first_run))).await.unwrap();
        assert_eq!(summary.created, 1);

        let summary = loader
            .load(&result(service("GP", first_run + Duration::hours(1))))
            .await
            .unwrap();
        assert_eq!(summary.unchanged, 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_replace_keeps_creation_fields() {
        let store = Arc::new(InMemoryCanonicalStore::new());
        let loader = CanonicalLoader::new(store.clone());
        let first_run = Utc::now();
        let second_run = first_run + Duration::hours(1);

        loader.load(&result(service("GP", first_run))).await.unwrap();
        let summary = loader
            .load(&result(service("Renamed GP", second_run)))
            .await
            .unwrap();
        assert_eq!(summary.replaced, 1);

        let stored = store.get(Uuid::from_u128(9)).await.unwrap().unwrap();
        let stored: HealthcareService = serde_json::from_value(stored.document).unwrap();
        assert_eq!(stored.name, "Renamed GP");
        assert_eq!(stored.audit.created_time, first_run);
        assert_eq!(stored.audit.last_updated, second_run);
    }
}
