//! Integration tests for the sync orchestrator.
//!
//! These tests use the real SyncOrchestrator with the in-memory repository
//! implementations, plus mock stores and transformers for failure paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::json;
use service_migration::consumer::QueueMessage;
use service_migration::errors::{SyncError, TransformError};
use service_migration::identity::IdentityMapper;
use service_migration::loader::CanonicalLoader;
use service_migration::orchestrator::{OrchestratorConfig, SyncMetrics, SyncOrchestrator};
use service_migration::transformer::{
    Eligibility, GpPracticeTransformer, ServiceMapper, ServiceTransformer, TransformationResult,
    TransformerRegistry, ValidationIssue,
};
use service_migration_repository::{
    CanonicalStore, CanonicalStoreError, DocumentFilter, InMemoryCanonicalStore,
    InMemoryLegacySource, LegacyPage, LegacyRecordSource, LegacySourceError, PageCursor,
};
use service_migration_shared::{
    CanonicalDocument, EntityKind, LegacyRecordFilter, LegacyServiceRecord, MetadataCache,
};
use uuid::Uuid;

fn metadata() -> MetadataCache {
    MetadataCache::default().with_service_type(100, "GP Practice")
}

fn gp_record(id: i64, ods_code: &str) -> LegacyServiceRecord {
    LegacyServiceRecord {
        id,
        uid: id.to_string(),
        type_id: 100,
        status_id: 1,
        name: "Test GP".to_string(),
        ods_code: Some(ods_code.to_string()),
        address: Some("1 High Street$Headingley".to_string()),
        town: Some("Leeds".to_string()),
        postcode: Some("LS6 1AA".to_string()),
        ..Default::default()
    }
}

/// A GP practice record whose location fails fatal validation.
fn record_without_address(id: i64) -> LegacyServiceRecord {
    LegacyServiceRecord {
        address: None,
        town: None,
        postcode: None,
        ..gp_record(id, "B12345")
    }
}

fn build(
    source: Arc<dyn LegacyRecordSource>,
    store: Arc<dyn CanonicalStore>,
    config: OrchestratorConfig,
) -> SyncOrchestrator {
    SyncOrchestrator::new(
        source,
        TransformerRegistry::with_default_transformers(Arc::new(metadata())),
        CanonicalLoader::new(store),
        config,
    )
}

fn in_memory(
    records: Vec<LegacyServiceRecord>,
) -> (SyncOrchestrator, Arc<InMemoryCanonicalStore>) {
    let store = Arc::new(InMemoryCanonicalStore::new());
    let orchestrator = build(
        Arc::new(InMemoryLegacySource::new(records, metadata())),
        store.clone(),
        OrchestratorConfig::default(),
    );
    (orchestrator, store)
}

fn services_event(id: &str, record_id: i64, method: &str) -> QueueMessage {
    QueueMessage::new(
        id,
        json!({"table_name": "services", "record_id": record_id, "method": method}).to_string(),
    )
}

// Canonical store whose writes always fail
struct UnreachableStore {
    upsert_calls: AtomicUsize,
}

#[async_trait]
impl CanonicalStore for UnreachableStore {
    async fn get(&self, _id: Uuid) -> Result<Option<CanonicalDocument>, CanonicalStoreError> {
        Ok(None)
    }

    async fn upsert(&self, _document: &CanonicalDocument) -> Result<(), CanonicalStoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        Err(CanonicalStoreError::unavailable("connection refused"))
    }

    fn iterate(
        &self,
        _filter: DocumentFilter,
    ) -> BoxStream<'_, Result<CanonicalDocument, CanonicalStoreError>> {
        stream::empty().boxed()
    }
}

// Legacy source that cannot be read
struct UnreachableSource;

#[async_trait]
impl LegacyRecordSource for UnreachableSource {
    async fn read_by_id(&self, _id: i64) -> Result<Option<LegacyServiceRecord>, LegacySourceError> {
        Err(LegacySourceError::unavailable("connection refused"))
    }

    async fn read_page(
        &self,
        _cursor: Option<PageCursor>,
        _filter: &LegacyRecordFilter,
        _page_size: usize,
    ) -> Result<LegacyPage, LegacySourceError> {
        Err(LegacySourceError::unavailable("connection refused"))
    }

    async fn read_metadata(&self) -> Result<MetadataCache, LegacySourceError> {
        Err(LegacySourceError::unavailable("connection refused"))
    }
}

// Transformer that claims every record and always fails to map it
struct AlwaysFails;

impl ServiceTransformer for AlwaysFails {
    fn name(&self) -> &'static str {
        "always_fails"
    }

    fn is_supported(&self, _record: &LegacyServiceRecord) -> Eligibility {
        Eligibility::Eligible
    }

    fn should_include(&self, _record: &LegacyServiceRecord) -> Eligibility {
        Eligibility::Eligible
    }

    fn transform(
        &self,
        _record: &LegacyServiceRecord,
        _issues: &mut Vec<ValidationIssue>,
    ) -> Result<TransformationResult, TransformError> {
        Err(TransformError::precondition("mapping failed"))
    }
}

#[tokio::test]
async fn test_full_sync_migrates_gp_practice() {
    let (mut orchestrator, store) = in_memory(vec![gp_record(300010, "A12345")]);

    let metrics = orchestrator.full_sync().await.unwrap();

    assert_eq!(
        metrics,
        SyncMetrics {
            total: 1,
            supported: 1,
            unsupported: 0,
            transformed: 1,
            migrated: 1,
            skipped: 0,
            errors: 0,
        }
    );

    let documents = store.documents();
    let count = |kind: EntityKind| documents.iter().filter(|d| d.entity_kind == kind).count();
    assert_eq!(count(EntityKind::Organisation), 1);
    assert_eq!(count(EntityKind::Location), 1);
    assert_eq!(count(EntityKind::HealthcareService), 1);

    let identity = IdentityMapper::new();
    let organisation = store
        .get(identity.organisation_id(300010))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(organisation.document["identifier_ODS_ODSCode"], "A12345");

    let service = store
        .get(identity.healthcare_service_id(300010))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        service.document["providedBy"],
        json!(identity.organisation_id(300010))
    );
    assert_eq!(
        service.document["location"],
        json!(identity.location_id(300010))
    );
}

#[tokio::test]
async fn test_repeated_full_sync_leaves_store_unchanged() {
    let (mut orchestrator, store) = in_memory(vec![
        gp_record(1, "A12345"),
        gp_record(2, "B12345"),
        gp_record(3, "C12345"),
    ]);

    orchestrator.full_sync().await.unwrap();
    let first_snapshot = store.documents();
    let first_writes = store.write_count();
    assert_eq!(first_writes, 9);

    let metrics = orchestrator.full_sync().await.unwrap();
    assert_eq!(metrics.migrated, 3);
    assert_eq!(store.write_count(), first_writes);
    assert_eq!(store.documents(), first_snapshot);
}

#[tokio::test]
async fn test_batch_reports_only_the_failing_message() {
    let (mut orchestrator, store) = in_memory(vec![
        gp_record(1, "A12345"),
        record_without_address(2),
        gp_record(3, "C12345"),
    ]);

    let failures = orchestrator
        .handle_batch(&[
            services_event("m1", 1, "insert"),
            services_event("m2", 2, "update"),
            services_event("m3", 3, "update"),
        ])
        .await;

    assert_eq!(failures, vec!["m2".to_string()]);

    let identity = IdentityMapper::new();
    for id in [1, 3] {
        assert!(store
            .get(identity.healthcare_service_id(id))
            .await
            .unwrap()
            .is_some());
    }
    assert!(store
        .get(identity.healthcare_service_id(2))
        .await
        .unwrap()
        .is_none());

    let metrics = orchestrator.metrics();
    assert_eq!(metrics.total, 3);
    assert_eq!(metrics.migrated, 2);
    assert_eq!(metrics.errors, 1);
}

#[tokio::test]
async fn test_deletes_and_unknown_tables_are_acknowledged() {
    let (mut orchestrator, store) = in_memory(vec![gp_record(1, "A12345")]);

    let failures = orchestrator
        .handle_batch(&[
            services_event("m1", 1, "delete"),
            QueueMessage::new(
                "m2",
                json!({"table_name": "openingtimes", "record_id": 1, "method": "update"})
                    .to_string(),
            ),
            QueueMessage::new(
                "m3",
                json!({"source": "relay", "event": {"tableName": "services", "recordId": 1, "method": "DELETE"}})
                    .to_string(),
            ),
        ])
        .await;

    assert!(failures.is_empty());
    assert_eq!(store.write_count(), 0);
    assert_eq!(orchestrator.metrics().total, 0);
}

#[tokio::test]
async fn test_malformed_and_missing_records_fail() {
    let (mut orchestrator, _store) = in_memory(vec![gp_record(1, "A12345")]);

    let failures = orchestrator
        .handle_batch(&[
            QueueMessage::new("m1", "{not json"),
            QueueMessage::new("m2", json!({"source": "relay"}).to_string()),
            services_event("m3", 404, "update"),
            services_event("m4", 1, "update"),
        ])
        .await;

    assert_eq!(failures, vec!["m1", "m2", "m3"]);
    assert_eq!(orchestrator.metrics().migrated, 1);
}

#[tokio::test]
async fn test_relayed_event_is_processed() {
    let (mut orchestrator, store) = in_memory(vec![gp_record(1, "A12345")]);
    let message = QueueMessage::new(
        "m1",
        json!({"source": "relay", "event": {"table_name": "services", "record_id": 1, "method": "insert"}})
            .to_string(),
    );

    orchestrator.handle_message(&message).await.unwrap();
    assert_eq!(store.write_count(), 3);
}

#[tokio::test]
async fn test_single_event_propagates_transform_error() {
    let (mut orchestrator, _store) = in_memory(vec![record_without_address(2)]);

    let result = orchestrator
        .handle_message(&services_event("m1", 2, "update"))
        .await;

    assert!(matches!(
        result,
        Err(SyncError::Transform { record_id: 2, .. })
    ));
}

#[tokio::test]
async fn test_unreachable_store_aborts_full_sync() {
    let store = Arc::new(UnreachableStore {
        upsert_calls: AtomicUsize::new(0),
    });
    let mut orchestrator = build(
        Arc::new(InMemoryLegacySource::new(
            vec![gp_record(1, "A12345"), gp_record(2, "B12345")],
            metadata(),
        )),
        store.clone(),
        OrchestratorConfig::default(),
    );

    let result = orchestrator.full_sync().await;

    assert!(matches!(result, Err(SyncError::Persistence(_))));
    assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 1);
    let metrics = orchestrator.metrics();
    assert_eq!(metrics.total, 1);
    assert_eq!(metrics.errors, 1);
}

#[tokio::test]
async fn test_unreachable_source_aborts_full_sync() {
    let mut orchestrator = build(
        Arc::new(UnreachableSource),
        Arc::new(InMemoryCanonicalStore::new()),
        OrchestratorConfig::default(),
    );

    let result = orchestrator.full_sync().await;
    assert!(matches!(result, Err(SyncError::LegacySource(_))));
    assert_eq!(orchestrator.metrics().total, 0);
}

#[tokio::test]
async fn test_failed_transform_does_not_fall_back() {
    let metadata = Arc::new(metadata());
    let mut registry = TransformerRegistry::new();
    registry.register(Arc::new(AlwaysFails));
    registry.register(Arc::new(GpPracticeTransformer::new(ServiceMapper::new(
        IdentityMapper::new(),
        metadata.clone(),
    ))));

    let store = Arc::new(InMemoryCanonicalStore::new());
    let mut orchestrator = SyncOrchestrator::new(
        Arc::new(InMemoryLegacySource::new(
            vec![gp_record(1, "A12345")],
            (*metadata).clone(),
        )),
        registry,
        CanonicalLoader::new(store.clone()),
        OrchestratorConfig::default(),
    );

    let metrics = orchestrator.full_sync().await.unwrap();

    assert_eq!(metrics.total, 1);
    assert_eq!(metrics.errors, 1);
    assert_eq!(metrics.migrated, 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_expired_deadline_fails_remaining_messages() {
    let store = Arc::new(InMemoryCanonicalStore::new());
    let mut orchestrator = build(
        Arc::new(InMemoryLegacySource::new(
            vec![gp_record(1, "A12345")],
            metadata(),
        )),
        store.clone(),
        OrchestratorConfig {
            invocation_timeout: Some(Duration::ZERO),
            ..Default::default()
        },
    );

    let failures = orchestrator
        .handle_batch(&[
            services_event("m1", 1, "update"),
            services_event("m2", 1, "update"),
        ])
        .await;

    assert_eq!(failures, vec!["m1", "m2"]);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_full_sync_honours_filter_and_paging() {
    let mut records: Vec<LegacyServiceRecord> =
        (1..=7).map(|id| gp_record(id, "A12345")).collect();
    records.push(LegacyServiceRecord {
        type_id: 13,
        ..gp_record(8, "A12345")
    });

    let store = Arc::new(InMemoryCanonicalStore::new());
    let mut orchestrator = build(
        Arc::new(InMemoryLegacySource::new(records, metadata())),
        store.clone(),
        OrchestratorConfig {
            page_size: 3,
            ..Default::default()
        },
    );

    let metrics = orchestrator.full_sync().await.unwrap();
    assert_eq!(metrics.total, 7);
    assert_eq!(metrics.migrated, 7);

    let services: Vec<_> = store
        .iterate(DocumentFilter::kind(EntityKind::HealthcareService))
        .collect()
        .await;
    assert_eq!(services.len(), 7);
}
