use thiserror::Error;

/// Errors raised while reading the legacy directory.
#[derive(Debug, Error)]
pub enum LegacySourceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A row could not be mapped onto the legacy record shape.
    #[error("Invalid legacy row: {0}")]
    InvalidRow(String),

    #[error("Legacy source unavailable: {0}")]
    Unavailable(String),
}

impl LegacySourceError {
    pub fn invalid_row(msg: impl Into<String>) -> Self {
        Self::InvalidRow(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
