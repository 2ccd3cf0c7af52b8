//! Canonical document model.
//!
//! These are the entities the migration writes to the canonical store. Every
//! entity is keyed by a deterministic UUID and carries the same audit
//! metadata fields (`createdBy`, `createdTime`, `lastUpdatedBy`, `lastUpdated`)
//! flattened into the document root.

use crate::types::availability::AvailabilityEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record kind under which canonical entities are persisted.
pub const RECORD_KIND_DOCUMENT: &str = "document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditEventType {
    User,
    App,
    System,
}

/// The actor responsible for a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(rename = "type")]
    pub event_type: AuditEventType,
    pub value: String,
    pub display: String,
}

impl AuditEvent {
    /// The application actor recorded on every migrated entity.
    pub fn migration() -> Self {
        Self {
            event_type: AuditEventType::App,
            value: "INTERNAL001".to_string(),
            display: "Data Migration".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMetadata {
    pub created_by: AuditEvent,
    pub created_time: DateTime<Utc>,
    pub last_updated_by: AuditEvent,
    pub last_updated: DateTime<Utc>,
}

impl AuditMetadata {
    pub fn migration(at: DateTime<Utc>) -> Self {
        Self {
            created_by: AuditEvent::migration(),
            created_time: at,
            last_updated_by: AuditEvent::migration(),
            last_updated: at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telecom {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_public: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_private: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
}

impl Telecom {
    pub fn is_empty(&self) -> bool {
        self.phone_public.is_none()
            && self.phone_private.is_none()
            && self.email.is_none()
            && self.web.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: Uuid,
    #[serde(rename = "identifier_oldDoS_id")]
    pub identifier_old_dos_id: i64,
    pub status: String,
    pub connection_type: Option<String>,
    pub format: Option<String>,
    pub payload_type: Option<String>,
    pub payload_mime_type: Option<String>,
    pub address: Option<String>,
    pub order: Option<i64>,
    pub is_compression_enabled: bool,
    pub comment: Option<String>,
    pub business_scenario: Option<String>,
    pub managed_by_organisation: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    #[serde(flatten)]
    pub audit: AuditMetadata,
    pub id: Uuid,
    #[serde(rename = "identifier_ODS_ODSCode")]
    pub identifier_ods_code: Option<String>,
    pub active: bool,
    pub name: String,
    #[serde(rename = "type")]
    pub organisation_type: String,
    pub telecom: Option<Telecom>,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub county: Option<String>,
    pub town: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionGcs {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(flatten)]
    pub audit: AuditMetadata,
    pub id: Uuid,
    pub active: bool,
    pub managing_organisation: Uuid,
    pub name: Option<String>,
    pub address: Address,
    #[serde(rename = "positionGCS")]
    pub position_gcs: Option<PositionGcs>,
    pub primary_address: bool,
    pub part_of: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthcareServiceCategory {
    #[serde(rename = "GP Services")]
    GpServices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthcareServiceType {
    #[serde(rename = "GP Consultation Service")]
    GpConsultationService,
    #[serde(rename = "GP Protected Learning Time Service")]
    GpProtectedLearningTimeService,
    #[serde(rename = "GP Special Allocation Scheme Service")]
    GpSpecialAllocationSchemeService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomGroupSymptomDiscriminator {
    pub sg: i64,
    pub sd: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRange {
    pub range_from: f64,
    pub range_to: f64,
    #[serde(rename = "type")]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcareService {
    #[serde(flatten)]
    pub audit: AuditMetadata,
    pub id: Uuid,
    #[serde(rename = "identifier_oldDoS_uid")]
    pub identifier_old_dos_uid: String,
    pub active: bool,
    pub category: HealthcareServiceCategory,
    #[serde(rename = "type")]
    pub service_type: HealthcareServiceType,
    pub provided_by: Option<Uuid>,
    pub location: Option<Uuid>,
    pub name: String,
    pub telecom: Option<Telecom>,
    pub opening_time: Vec<AvailabilityEntry>,
    pub symptom_group_symptom_discriminators: Vec<SymptomGroupSymptomDiscriminator>,
    pub dispositions: Vec<String>,
    pub age_eligibility_criteria: Option<Vec<AgeRange>>,
}

/// Entity kinds held in the canonical store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Organisation,
    Location,
    HealthcareService,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organisation => "organisation",
            Self::Location => "location",
            Self::HealthcareService => "healthcare_service",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "organisation" => Some(Self::Organisation),
            "location" => Some(Self::Location),
            "healthcare_service" => Some(Self::HealthcareService),
            _ => None,
        }
    }
}

/// Any entity a transformer can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalEntity {
    Organisation(Organisation),
    Location(Location),
    HealthcareService(HealthcareService),
}

impl CanonicalEntity {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Organisation(organisation) => organisation.id,
            Self::Location(location) => location.id,
            Self::HealthcareService(service) => service.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Organisation(_) => EntityKind::Organisation,
            Self::Location(_) => EntityKind::Location,
            Self::HealthcareService(_) => EntityKind::HealthcareService,
        }
    }

    /// Serializes the entity into the stored document form.
    pub fn to_document(&self) -> Result<CanonicalDocument, serde_json::Error> {
        let document = match self {
            Self::Organisation(organisation) => serde_json::to_value(organisation)?,
            Self::Location(location) => serde_json::to_value(location)?,
            Self::HealthcareService(service) => serde_json::to_value(service)?,
        };
        Ok(CanonicalDocument {
            id: self.id(),
            record_kind: RECORD_KIND_DOCUMENT.to_string(),
            entity_kind: self.kind(),
            document,
        })
    }
}

/// A canonical entity as held by the store, keyed by `(id, record_kind)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    pub id: Uuid,
    pub record_kind: String,
    pub entity_kind: EntityKind,
    pub document: serde_json::Value,
}
