use thiserror::Error;

/// Errors raised while appending version-history records.
#[derive(Debug, Error)]
pub enum AuditSinkError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// An entry already exists for this `(entity_id, timestamp)` key.
    #[error("Version history entry already exists: {entity_id} at {timestamp}")]
    DuplicateEntry { entity_id: String, timestamp: String },

    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

impl AuditSinkError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
