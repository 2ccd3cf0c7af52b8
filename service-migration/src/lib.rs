//! # Service Migration
//!
//! Migrates the legacy service directory into the canonical document store
//! and keeps the two synchronized.
//!
//! ## Architecture
//!
//! The pipeline follows the Consumer-Transformer-Loader pattern:
//!
//! 1. **Consumer**: Decodes queued change events
//! 2. **Transformer**: Selects a transformer per record and maps it onto canonical entities
//! 3. **Loader**: Upserts entities into the canonical store by deterministic id
//! 4. **Orchestrator**: Drives full sync, single events and batches
//!
//! A separate change detector turns the canonical store's change stream into
//! an append-only version history.
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`consumer`]: Change-event decoding
//! - [`identity`]: Deterministic legacy id to UUID mapping
//! - [`availability`]: Opening-time aggregation
//! - [`transformer`]: Per-category transformers and the registry
//! - [`loader`]: Canonical store writes
//! - [`orchestrator`]: Invocation driver and metrics
//! - [`version_history`]: Change capture and audit trail
//! - [`errors`]: Error types for the pipeline

pub mod availability;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod identity;
pub mod loader;
pub mod orchestrator;
pub mod transformer;
pub mod version_history;

pub use config::Dependencies;
pub use errors::SyncError;

use service_migration_repository::LegacySourceError;
use thiserror::Error;

/// Errors that can occur during initialization or execution of the binary.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Legacy source error: {0}")]
    LegacySource(#[from] LegacySourceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrationError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
