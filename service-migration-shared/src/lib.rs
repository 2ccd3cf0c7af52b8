//! # Service Migration Shared
//!
//! This crate defines the data structures shared across the service migration
//! pipeline: the legacy record shape read from the directory database, the
//! canonical entities written to the document store, availability entries and
//! version-history audit records.

pub mod types;

pub use types::availability::{AvailabilityEntry, DayOfWeek};
pub use types::canonical::{
    Address, AgeRange, AuditEvent, AuditEventType, AuditMetadata, CanonicalDocument,
    CanonicalEntity, Endpoint, EntityKind, HealthcareService, HealthcareServiceCategory,
    HealthcareServiceType, Location, Organisation, PositionGcs, SymptomGroupSymptomDiscriminator,
    Telecom, RECORD_KIND_DOCUMENT,
};
pub use types::legacy_record::{
    LegacyAgeRange, LegacyDayOpening, LegacyEndpoint, LegacyRecordFilter, LegacyServiceRecord,
    LegacySgsd, LegacySpecifiedOpening, ServiceStatus,
};
pub use types::metadata::{Disposition, MetadataCache, BANK_HOLIDAY_DAY_NAME};
pub use types::version_history::{ChangeType, ChangedBy, FieldChange, VersionHistoryRecord};
