//! Error types for the storage seams.
//!
//! Each seam has its own error enum so callers can tell a legacy read failure
//! from a canonical write failure.

mod audit_sink;
mod canonical_store;
mod legacy_source;

pub use audit_sink::AuditSinkError;
pub use canonical_store::CanonicalStoreError;
pub use legacy_source::LegacySourceError;
