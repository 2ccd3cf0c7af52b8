use thiserror::Error;

/// Errors raised by the canonical document store.
#[derive(Debug, Error)]
pub enum CanonicalStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A stored row carried an entity kind this build does not know.
    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl CanonicalStoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
