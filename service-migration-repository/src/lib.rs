//! # Service Migration Repository
//!
//! This crate provides the storage seams of the migration pipeline: reading
//! legacy records, reading and writing canonical documents, and appending
//! version-history entries. Each seam is an async trait with an in-memory
//! implementation (used by tests and local runs) and a PostgreSQL one.

pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::{AuditSinkError, CanonicalStoreError, LegacySourceError};
pub use interfaces::{
    AuditSink, CanonicalStore, DocumentFilter, LegacyPage, LegacyRecordSource, PageCursor,
};
pub use memory::{InMemoryAuditSink, InMemoryCanonicalStore, InMemoryLegacySource};
pub use postgres::{PostgresAuditSink, PostgresCanonicalStore, PostgresLegacySource};
