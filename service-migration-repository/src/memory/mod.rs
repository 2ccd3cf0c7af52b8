//! In-memory implementations of the storage traits.
//!
//! These back the test suites and local dry runs. They hold everything in a
//! `Mutex`-guarded map and never touch the network.

mod audit_sink;
mod canonical_store;
mod legacy_source;

pub use audit_sink::InMemoryAuditSink;
pub use canonical_store::InMemoryCanonicalStore;
pub use legacy_source::InMemoryLegacySource;
