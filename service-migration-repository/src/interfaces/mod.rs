//! Storage trait definitions.
//!
//! Implementations are injected into the pipeline as `Arc<dyn Trait>`, which
//! keeps the orchestrator independent of the backing database and lets tests
//! substitute in-memory or failing implementations.

mod audit_sink;
mod canonical_store;
mod legacy_record_source;

pub use audit_sink::AuditSink;
pub use canonical_store::{CanonicalStore, DocumentFilter};
pub use legacy_record_source::{LegacyPage, LegacyRecordSource, PageCursor};
