use async_trait::async_trait;
use service_migration_shared::VersionHistoryRecord;
use std::sync::Mutex;

use crate::errors::AuditSinkError;
use crate::interfaces::AuditSink;

/// Append-only audit log held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<VersionHistoryRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<VersionHistoryRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, record: &VersionHistoryRecord) -> Result<(), AuditSinkError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| AuditSinkError::unavailable("in-memory audit sink lock poisoned"))?;

        let duplicate = records.iter().any(|existing| {
            existing.entity_id == record.entity_id && existing.timestamp == record.timestamp
        });
        if duplicate {
            return Err(AuditSinkError::DuplicateEntry {
                entity_id: record.entity_id.clone(),
                timestamp: record.timestamp.clone(),
            });
        }

        records.push(record.clone());
        Ok(())
    }
}
