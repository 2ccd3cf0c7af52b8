//! PostgreSQL implementations of the storage traits.
//!
//! The canonical store and the audit sink share one database whose schema is
//! managed by the embedded migrations. The legacy source reads the
//! `pathwaysdos` schema of the legacy directory and never writes to it.

mod audit_sink;
mod canonical_store;
mod legacy_source;

pub use audit_sink::PostgresAuditSink;
pub use canonical_store::PostgresCanonicalStore;
pub use legacy_source::PostgresLegacySource;

/// Apply the canonical store and version-history migrations.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
