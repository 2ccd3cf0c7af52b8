//! Dependency initialization and wiring for the migration binary.

use service_migration_repository::postgres::run_migrations;
use service_migration_repository::{
    LegacyRecordSource, PostgresAuditSink, PostgresCanonicalStore, PostgresLegacySource,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use super::settings::{ConnectionMode, Settings};
use crate::loader::CanonicalLoader;
use crate::orchestrator::SyncOrchestrator;
use crate::transformer::TransformerRegistry;
use crate::version_history::ChangeDetector;
use crate::MigrationError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Full sync and change-event processing.
    pub orchestrator: SyncOrchestrator,
    /// Version-history capture.
    pub change_detector: ChangeDetector,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`Settings::from_env`] for the variables read.
    pub async fn new() -> Result<Self, MigrationError> {
        Self::from_settings(Settings::from_env()?).await
    }

    pub async fn from_settings(settings: Settings) -> Result<Self, MigrationError> {
        info!(
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            page_size = settings.orchestrator.page_size,
            max_pages = settings.orchestrator.max_pages,
            type_ids = ?settings.orchestrator.filter.type_ids,
            status_ids = ?settings.orchestrator.filter.status_ids,
            "Initializing dependencies"
        );

        let legacy_pool = Self::connect(
            "legacy",
            &settings.legacy_database_url,
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;
        let canonical_pool = Self::connect(
            "canonical",
            &settings.canonical_database_url,
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;

        run_migrations(&canonical_pool).await?;
        info!("Canonical store migrations applied");

        let source = Arc::new(PostgresLegacySource::new(legacy_pool));
        let metadata = Arc::new(source.read_metadata().await?);
        info!("Legacy metadata loaded");

        let orchestrator = SyncOrchestrator::new(
            source,
            TransformerRegistry::with_default_transformers(metadata),
            CanonicalLoader::new(Arc::new(PostgresCanonicalStore::new(canonical_pool.clone()))),
            settings.orchestrator,
        );
        let change_detector = ChangeDetector::new(Arc::new(PostgresAuditSink::new(canonical_pool)));

        Ok(Self {
            orchestrator,
            change_detector,
        })
    }

    /// Connect to a database with retry logic based on connection mode.
    async fn connect(
        name: &str,
        url: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<PgPool, MigrationError> {
        loop {
            match PgPool::connect(url).await {
                Ok(pool) => {
                    info!(database = name, "Database connection established");
                    return Ok(pool);
                }
                Err(e) => match mode {
                    ConnectionMode::FailFast => return Err(MigrationError::Database(e)),
                    ConnectionMode::Retry => {
                        warn!(
                            database = name,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to database, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
