//! Append-only destination for version-history records.

use async_trait::async_trait;
use service_migration_shared::VersionHistoryRecord;

use crate::errors::AuditSinkError;

#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record. Existing entries are never updated in place.
    async fn append(&self, record: &VersionHistoryRecord) -> Result<(), AuditSinkError>;
}
