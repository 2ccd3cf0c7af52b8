//! Version history for canonical documents.
//!
//! Consumes the canonical store's change-capture stream, diffs each record's
//! before and after snapshots and appends a [`VersionHistoryRecord`] when a
//! business field changed.
//!
//! [`VersionHistoryRecord`]: service_migration_shared::VersionHistoryRecord

pub mod attribute_value;
pub mod diff;
mod processor;

pub use diff::{detect_changes, extract_changed_by, EXCLUDED_FIELDS};
pub use processor::{
    audit_timestamp, entity_id, table_name, CaptureOutcome, ChangeDetector, StreamRecord,
};
