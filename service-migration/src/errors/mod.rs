//! Error types for the migration pipeline.

use service_migration_repository::{AuditSinkError, CanonicalStoreError, LegacySourceError};
use thiserror::Error;

/// Errors raised while mapping a legacy record onto canonical entities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The record does not meet a structural requirement of the transformer.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A fatal validation issue was raised.
    #[error("Validation failed ({code}): {diagnostics}")]
    Validation { code: String, diagnostics: String },

    /// Reference data needed by the mapping is missing.
    #[error("Missing metadata: {0}")]
    MissingMetadata(String),
}

impl TransformError {
    /// Create a precondition error.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a missing metadata error.
    pub fn missing_metadata(msg: impl Into<String>) -> Self {
        Self::MissingMetadata(msg.into())
    }
}

/// Errors raised while decoding a queued change event.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}

impl DecodeError {
    /// Create a malformed event error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedEvent(msg.into())
    }
}

/// Errors raised while turning one change-capture record into an audit entry.
#[derive(Error, Debug)]
pub enum ChangeCaptureError {
    #[error("Could not find table name in source locator: {0}")]
    MissingTableName(String),

    #[error("Change record has no id key")]
    MissingRecordId,

    #[error("Invalid attribute value: {0}")]
    InvalidAttributeValue(String),

    #[error("Audit sink error: {0}")]
    AuditSink(#[from] AuditSinkError),
}

impl ChangeCaptureError {
    /// Create an invalid attribute value error.
    pub fn invalid_attribute(msg: impl Into<String>) -> Self {
        Self::InvalidAttributeValue(msg.into())
    }
}

/// Errors raised by the sync orchestrator.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A single record failed to transform.
    #[error("Failed to transform record {record_id}: {source}")]
    Transform {
        record_id: i64,
        #[source]
        source: TransformError,
    },

    /// A change event referred to a record the legacy source does not hold.
    #[error("Legacy record {0} not found")]
    RecordNotFound(i64),

    #[error("Legacy source error: {0}")]
    LegacySource(#[from] LegacySourceError),

    #[error("Canonical store error: {0}")]
    Persistence(#[from] CanonicalStoreError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The invocation deadline passed before the work finished.
    #[error("Invocation deadline exceeded after {processed} records")]
    DeadlineExceeded { processed: u64 },
}

impl SyncError {
    /// Whether the error belongs to one record rather than the whole run.
    pub fn is_record_level(&self) -> bool {
        matches!(self, Self::Transform { .. } | Self::RecordNotFound(_))
    }
}
