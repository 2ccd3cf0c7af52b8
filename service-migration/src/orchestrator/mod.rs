//! Orchestrator module for the migration pipeline.
//!
//! Drives the three invocation kinds: a paginated full sync over the legacy
//! source, a single change event, and a batch of queued change events with
//! per-message failure reporting. Every invocation resets the run metrics on
//! entry and logs them on exit, whether it succeeded or not.

mod metrics;

pub use metrics::SyncMetrics;

use service_migration_repository::{LegacyRecordSource, PageCursor};
use service_migration_shared::{LegacyRecordFilter, LegacyServiceRecord};
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{ChangeEvent, ChangeMethod, QueueMessage};
use crate::errors::{DecodeError, SyncError};
use crate::loader::CanonicalLoader;
use crate::transformer::{Selection, TransformerRegistry};

/// Legacy table holding service rows.
pub const SERVICES_TABLE: &str = "services";

/// Legacy table holding endpoint rows; events resync the parent service.
pub const SERVICE_ENDPOINTS_TABLE: &str = "serviceendpoints";

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Records requested per legacy page.
    pub page_size: usize,
    /// Upper bound on pages read by one full sync.
    pub max_pages: usize,
    /// Cooperative deadline for one invocation.
    pub invocation_timeout: Option<Duration>,
    /// Restricts which legacy records a full sync scans.
    pub filter: LegacyRecordFilter,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            page_size: 500,
            max_pages: 10_000,
            invocation_timeout: None,
            filter: LegacyRecordFilter {
                type_ids: vec![100, 136, 159],
                status_ids: vec![],
            },
        }
    }
}

/// Terminal outcome of one legacy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Unsupported,
    Skipped,
    Migrated,
}

/// Coordinates the legacy source, transformer registry and loader.
pub struct SyncOrchestrator {
    source: Arc<dyn LegacyRecordSource>,
    registry: TransformerRegistry,
    loader: CanonicalLoader,
    config: OrchestratorConfig,
    metrics: SyncMetrics,
}

impl SyncOrchestrator {
    pub fn new(
        source: Arc<dyn LegacyRecordSource>,
        registry: TransformerRegistry,
        loader: CanonicalLoader,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            source,
            registry,
            loader,
            config,
            metrics: SyncMetrics::default(),
        }
    }

    /// Counters of the current or most recent invocation.
    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Migrate every legacy record matching the configured filter.
    ///
    /// Per-record transform failures are counted and the run continues.
    /// Source or store failures abort the run.
    #[instrument(skip(self))]
    pub async fn full_sync(&mut self) -> Result<SyncMetrics, SyncError> {
        self.metrics.reset();
        let deadline = self.deadline();
        info!(
            page_size = self.config.page_size,
            max_pages = self.config.max_pages,
            "Starting full sync"
        );

        let result = self.scan_pages(deadline).await;
        self.metrics.log_summary("full_sync");

        if let Err(e) = &result {
            error!(error = %e, "Full sync aborted");
        }
        result.map(|()| self.metrics.clone())
    }

    async fn scan_pages(&mut self, deadline: Option<Instant>) -> Result<(), SyncError> {
        let mut cursor: Option<PageCursor> = None;

        for page_number in 0..self.config.max_pages {
            let page = self
                .source
                .read_page(cursor, &self.config.filter, self.config.page_size)
                .await?;
            debug!(
                page = page_number,
                records = page.records.len(),
                "Read legacy page"
            );

            for record in page.records {
                if deadline_passed(deadline) {
                    return Err(SyncError::DeadlineExceeded {
                        processed: self.metrics.total,
                    });
                }
                match self.process_record(record).await {
                    Ok(_) => {}
                    Err(e) if e.is_record_level() => {}
                    Err(e) => return Err(e),
                }
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(()),
            }
        }

        warn!(
            max_pages = self.config.max_pages,
            "Page ceiling reached before the legacy source was exhausted"
        );
        Ok(())
    }

    /// Run one legacy record through selection, transform and load.
    ///
    /// The record is counted in exactly one terminal bucket whatever the result.
    #[instrument(skip(self, record), fields(record_id = record.id))]
    pub async fn process_record(
        &mut self,
        record: LegacyServiceRecord,
    ) -> Result<RecordOutcome, SyncError> {
        self.metrics.total += 1;

        let transformed = match self.registry.select(&record) {
            Selection::Unsupported { reasons } => {
                debug!(?reasons, "No transformer supports record");
                self.metrics.unsupported += 1;
                return Ok(RecordOutcome::Unsupported);
            }
            Selection::Excluded {
                transformer,
                reason,
            } => {
                debug!(transformer = transformer.name(), %reason, "Record excluded");
                self.metrics.supported += 1;
                self.metrics.skipped += 1;
                return Ok(RecordOutcome::Skipped);
            }
            Selection::Selected(transformer) => {
                self.metrics.supported += 1;
                let mut issues = Vec::new();
                transformer
                    .transform(&record, &mut issues)
                    .map(|result| result.with_issues(issues))
                    .map_err(|source| (transformer.name(), source))
            }
        };

        let result = match transformed {
            Ok(result) => result,
            Err((transformer, source)) => {
                error!(transformer, error = %source, "Failed to transform record");
                self.metrics.errors += 1;
                return Err(SyncError::Transform {
                    record_id: record.id,
                    source,
                });
            }
        };
        self.metrics.transformed += 1;

        for issue in &result.validation_issues {
            warn!(
                code = %issue.code,
                severity = ?issue.severity,
                diagnostics = %issue.diagnostics,
                "Validation issue"
            );
        }

        match self.loader.load(&result).await {
            Ok(summary) => {
                debug!(?summary, "Loaded record");
                self.metrics.migrated += 1;
                Ok(RecordOutcome::Migrated)
            }
            Err(e) => {
                self.metrics.errors += 1;
                Err(e)
            }
        }
    }

    /// Apply one decoded change event.
    ///
    /// Deletes, unknown methods and unknown tables are logged and ignored.
    #[instrument(skip(self), fields(table = %event.table_name, record_id = event.record_id))]
    pub async fn handle_change_event(&mut self, event: &ChangeEvent) -> Result<(), SyncError> {
        if let ChangeMethod::Other(method) = &event.method {
            warn!(%method, "Unrecognised change method, ignoring event");
            return Ok(());
        }

        match event.table_name.as_str() {
            SERVICES_TABLE if event.method.is_upsert() => self.sync_service(event.record_id).await,
            SERVICES_TABLE => {
                info!("Service delete events are not migrated, ignoring");
                Ok(())
            }
            SERVICE_ENDPOINTS_TABLE => {
                let service_id = event.service_id.ok_or_else(|| {
                    DecodeError::malformed("serviceendpoints event has no service_id")
                })?;
                self.sync_service(service_id).await
            }
            table => {
                info!(table, "No handler for table, ignoring event");
                Ok(())
            }
        }
    }

    async fn sync_service(&mut self, service_id: i64) -> Result<(), SyncError> {
        let record = self
            .source
            .read_by_id(service_id)
            .await?
            .ok_or(SyncError::RecordNotFound(service_id))?;
        self.process_record(record).await.map(|_| ())
    }

    /// Decode and apply a single queued message as its own invocation.
    pub async fn handle_message(&mut self, message: &QueueMessage) -> Result<(), SyncError> {
        self.metrics.reset();
        let result = self.apply_message(message).await;
        self.metrics.log_summary("event");
        result
    }

    async fn apply_message(&mut self, message: &QueueMessage) -> Result<(), SyncError> {
        let event = ChangeEvent::decode(&message.body)?;
        self.handle_change_event(&event).await
    }

    /// Apply a batch of queued messages and return the ids that failed.
    ///
    /// A failing message never stops the batch. Messages left unprocessed when
    /// the invocation deadline passes are reported as failed so they are
    /// redelivered.
    #[instrument(skip(self, messages), fields(batch_size = messages.len()))]
    pub async fn handle_batch(&mut self, messages: &[QueueMessage]) -> Vec<String> {
        self.metrics.reset();
        let deadline = self.deadline();
        let mut failures = Vec::new();

        for (index, message) in messages.iter().enumerate() {
            if deadline_passed(deadline) {
                warn!(
                    remaining = messages.len() - index,
                    "Invocation deadline passed, failing remaining messages"
                );
                failures.extend(messages[index..].iter().map(|m| m.message_id.clone()));
                break;
            }

            if let Err(e) = self.apply_message(message).await {
                error!(message_id = %message.message_id, error = %e, "Failed to process message");
                failures.push(message.message_id.clone());
            }
        }

        self.metrics.log_summary("batch");
        info!(failed = failures.len(), "Batch processed");
        failures
    }

    fn deadline(&self) -> Option<Instant> {
        self.config
            .invocation_timeout
            .map(|timeout| Instant::now() + timeout)
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_migration_repository::{InMemoryCanonicalStore, InMemoryLegacySource};
    use service_migration_shared::{LegacySgsd, MetadataCache};

    fn metadata() -> MetadataCache {
        MetadataCache::default().with_service_type(100, "GP Practice")
    }

    fn gp_record(id: i64, ods_code: &str) -> LegacyServiceRecord {
        LegacyServiceRecord {
            id,
            uid: id.to_string(),
            type_id: 100,
            status_id: 1,
            name: "Abbey Surgery".to_string(),
            ods_code: Some(ods_code.to_string()),
            address: Some("1 High Street".to_string()),
            town: Some("Leeds".to_string()),
            postcode: Some("LS1 1AA".to_string()),
            ..Default::default()
        }
    }

    fn orchestrator(records: Vec<LegacyServiceRecord>) -> SyncOrchestrator {
        let metadata = Arc::new(metadata());
        SyncOrchestrator::new(
            Arc::new(InMemoryLegacySource::new(records, (*metadata).clone())),
            TransformerRegistry::with_default_transformers(metadata),
            CanonicalLoader::new(Arc::new(InMemoryCanonicalStore::new())),
            OrchestratorConfig {
                page_size: 2,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_terminal_buckets_partition_total() {
        let mut orchestrator = orchestrator(vec![
            gp_record(1, "A12345"),
            gp_record(2, "A1234"),
            LegacyServiceRecord {
                status_id: 2,
                ..gp_record(3, "B12345")
            },
            LegacyServiceRecord {
                address: None,
                town: None,
                postcode: None,
                ..gp_record(4, "C12345")
            },
            LegacyServiceRecord {
                name: "Abbey PLT".to_string(),
                sgsds: vec![LegacySgsd { sg_id: 1, sd_id: 2 }],
                ..gp_record(5, "D12345")
            },
        ]);

        let metrics = orchestrator.full_sync().await.unwrap();

        assert_eq!(metrics.total, 5);
        assert_eq!(metrics.unsupported, 1);
        assert_eq!(metrics.skipped, 1);
        assert_eq!(metrics.errors, 1);
        assert_eq!(metrics.migrated, 2);
        assert_eq!(metrics.supported, 4);
        assert_eq!(metrics.transformed, 2);
        assert_eq!(metrics.terminal_count(), metrics.total);
    }

    #[tokio::test]
    async fn test_page_ceiling_stops_scan() {
        let records = (1..=10).map(|id| gp_record(id, "A12345")).collect();
        let mut orchestrator = orchestrator(records);
        orchestrator.config.max_pages = 2;

        let metrics = orchestrator.full_sync().await.unwrap();
        assert_eq!(metrics.total, 4);
    }

    #[tokio::test]
    async fn test_expired_deadline_aborts_full_sync() {
        let mut orchestrator = orchestrator(vec![gp_record(1, "A12345")]);
        orchestrator.config.invocation_timeout = Some(Duration::ZERO);

        let result = orchestrator.full_sync().await;
        assert!(matches!(
            result,
            Err(SyncError::DeadlineExceeded { processed: 0 })
        ));
    }

    #[tokio::test]
    async fn test_unknown_method_is_ignored() {
        let mut orchestrator = orchestrator(vec![]);
        let event = ChangeEvent {
            table_name: SERVICES_TABLE.to_string(),
            record_id: 1,
            method: ChangeMethod::Other("truncate".to_string()),
            service_id: None,
        };

        orchestrator.handle_change_event(&event).await.unwrap();
        assert_eq!(orchestrator.metrics().total, 0);
    }

    #[tokio::test]
    async fn test_missing_service_is_not_found() {
        let mut orchestrator = orchestrator(vec![]);
        let event = ChangeEvent {
            table_name: SERVICES_TABLE.to_string(),
            record_id: 42,
            method: ChangeMethod::Update,
            service_id: None,
        };

        let result = orchestrator.handle_change_event(&event).await;
        assert!(matches!(result, Err(SyncError::RecordNotFound(42))));
    }

    #[tokio::test]
    async fn test_endpoint_event_syncs_parent_service() {
        let mut orchestrator = orchestrator(vec![gp_record(7, "A12345")]);
        let event = ChangeEvent {
            table_name: SERVICE_ENDPOINTS_TABLE.to_string(),
            record_id: 900,
            method: ChangeMethod::Delete,
            service_id: Some(7),
        };

        orchestrator.handle_change_event(&event).await.unwrap();
        assert_eq!(orchestrator.metrics().migrated, 1);

        let orphan = ChangeEvent {
            service_id: None,
            ..event
        };
        let result = orchestrator.handle_change_event(&orphan).await;
        assert!(matches!(result, Err(SyncError::Decode(_))));
    }
}
