//! Entity builders shared by every transformer.

use chrono::Utc;
use service_migration_shared::{
    AgeRange, AuditMetadata, HealthcareService, HealthcareServiceCategory, HealthcareServiceType,
    LegacyEndpoint, LegacyServiceRecord, Location, MetadataCache, Organisation, PositionGcs,
    SymptomGroupSymptomDiscriminator, Telecom, Address, Endpoint,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::availability::AvailabilityAggregator;
use crate::errors::TransformError;
use crate::identity::IdentityMapper;
use crate::transformer::validation::SanitisedContact;

/// Endpoint status given to every migrated endpoint.
const ENDPOINT_STATUS_ACTIVE: &str = "active";

/// Transport whose endpoints carry no payload.
const TELEPHONE_TRANSPORT: &str = "telno";

/// Legacy compression value meaning compression is on.
const COMPRESSED: &str = "compressed";

/// Unit of every age eligibility range.
const AGE_UNIT_DAYS: &str = "days";

/// Ranges whose boundaries are within this many days are merged.
const AGE_RANGE_TOLERANCE_DAYS: f64 = 1.0;

/// Maps a legacy endpoint format onto a payload MIME type.
///
/// Unknown formats pass through unchanged.
pub fn payload_mime_type(format: &str) -> &str {
    match format {
        "PDF" => "application/pdf",
        "HTML" => "text/html",
        "FHIR" => "application/fhir",
        "email" => "message/rfc822",
        "XML" => "application/xml",
        "CDA" => "application/hl7-cda+xml",
        other => other,
    }
}

/// Category and type assigned to a healthcare service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceClassification {
    pub category: HealthcareServiceCategory,
    pub service_type: HealthcareServiceType,
}

/// Builds canonical entities from legacy records.
///
/// Holds the injected identity mapper, metadata cache and availability
/// aggregator so transformers share one set of collaborators.
#[derive(Debug, Clone)]
pub struct ServiceMapper {
    identity: IdentityMapper,
    metadata: Arc<MetadataCache>,
    availability: AvailabilityAggregator,
}

impl ServiceMapper {
    pub fn new(identity: IdentityMapper, metadata: Arc<MetadataCache>) -> Self {
        Self {
            identity,
            availability: AvailabilityAggregator::new(Arc::clone(&metadata)),
            metadata,
        }
    }

    pub fn identity(&self) -> &IdentityMapper {
        &self.identity
    }

    /// Audit metadata stamped with the current time.
    pub fn audit(&self) -> AuditMetadata {
        AuditMetadata::migration(Utc::now())
    }

    pub fn build_organisation(
        &self,
        record: &LegacyServiceRecord,
        name: String,
        contact: &SanitisedContact,
        audit: &AuditMetadata,
    ) -> Result<Organisation, TransformError> {
        let organisation_type = self
            .metadata
            .service_type_name(record.type_id)
            .ok_or_else(|| {
                TransformError::missing_metadata(format!("service type {}", record.type_id))
            })?
            .to_string();
        let id = self.identity.organisation_id(record.id);

        let telecom = Telecom {
            phone_public: contact.public_phone.clone(),
            phone_private: None,
            email: contact.email.clone(),
            web: non_blank(record.web.as_deref()),
        };

        Ok(Organisation {
            audit: audit.clone(),
            id,
            identifier_ods_code: record.ods_code().map(str::to_string),
            active: true,
            name,
            organisation_type,
            telecom: (!telecom.is_empty()).then_some(telecom),
            endpoints: record
                .endpoints
                .iter()
                .map(|endpoint| self.build_endpoint(endpoint, id))
                .collect(),
        })
    }

    pub fn build_endpoint(&self, endpoint: &LegacyEndpoint, organisation_id: Uuid) -> Endpoint {
        let is_telephone = endpoint.transport.as_deref() == Some(TELEPHONE_TRANSPORT);
        let (payload_type, payload_mime_type) = if is_telephone {
            (None, None)
        } else {
            (
                endpoint.interaction.clone(),
                endpoint
                    .format
                    .as_deref()
                    .map(|format| payload_mime_type(format).to_string()),
            )
        };

        Endpoint {
            id: self.identity.endpoint_id(endpoint.id),
            identifier_old_dos_id: endpoint.id,
            status: ENDPOINT_STATUS_ACTIVE.to_string(),
            connection_type: endpoint.transport.clone(),
            format: endpoint.format.clone(),
            payload_type,
            payload_mime_type,
            address: endpoint.address.clone(),
            order: endpoint.order,
            is_compression_enabled: endpoint.compression.as_deref() == Some(COMPRESSED),
            comment: endpoint.comment.clone(),
            business_scenario: endpoint.business_scenario.clone(),
            managed_by_organisation: organisation_id,
        }
    }

    pub fn build_location(
        &self,
        record: &LegacyServiceRecord,
        organisation_id: Uuid,
        address: Address,
        audit: &AuditMetadata,
    ) -> Location {
        let position_gcs = match (record.latitude, record.longitude) {
            (Some(latitude), Some(longitude)) => Some(PositionGcs {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Location {
            audit: audit.clone(),
            id: self.identity.location_id(record.id),
            active: true,
            managing_organisation: organisation_id,
            name: None,
            address,
            position_gcs,
            primary_address: true,
            part_of: None,
        }
    }

    pub fn build_healthcare_service(
        &self,
        record: &LegacyServiceRecord,
        classification: ServiceClassification,
        provided_by: Option<Uuid>,
        location: Option<Uuid>,
        contact: &SanitisedContact,
        audit: &AuditMetadata,
    ) -> HealthcareService {
        let telecom = Telecom {
            phone_public: contact.public_phone.clone(),
            phone_private: contact.non_public_phone.clone(),
            email: contact.email.clone(),
            web: non_blank(record.web.as_deref()),
        };

        HealthcareService {
            audit: audit.clone(),
            id: self.identity.healthcare_service_id(record.id),
            identifier_old_dos_uid: record.uid.clone(),
            active: true,
            category: classification.category,
            service_type: classification.service_type,
            provided_by,
            location,
            name: record.name.clone(),
            telecom: Some(telecom),
            opening_time: self.availability.for_service(
                record.id,
                &record.day_openings,
                &record.specified_openings,
            ),
            symptom_group_symptom_discriminators: self.build_sgsds(record),
            dispositions: self.build_dispositions(record),
            age_eligibility_criteria: self.build_age_eligibility_criteria(record),
        }
    }

    pub fn build_sgsds(&self, record: &LegacyServiceRecord) -> Vec<SymptomGroupSymptomDiscriminator> {
        record
            .sgsds
            .iter()
            .map(|pair| SymptomGroupSymptomDiscriminator {
                sg: pair.sg_id,
                sd: pair.sd_id,
            })
            .collect()
    }

    /// Disposition codes for the record; ids missing from metadata are skipped.
    pub fn build_dispositions(&self, record: &LegacyServiceRecord) -> Vec<String> {
        record
            .disposition_ids
            .iter()
            .filter_map(|&disposition_id| match self.metadata.disposition(disposition_id) {
                Some(disposition) => Some(disposition.code.clone()),
                None => {
                    warn!(
                        service_id = record.id,
                        disposition_id, "Disposition not found in metadata, skipping"
                    );
                    None
                }
            })
            .collect()
    }

    /// Merge age ranges that overlap or touch within a day.
    pub fn build_age_eligibility_criteria(
        &self,
        record: &LegacyServiceRecord,
    ) -> Option<Vec<AgeRange>> {
        if record.age_ranges.is_empty() {
            debug!(service_id = record.id, "No age ranges for service");
            return None;
        }

        let mut sorted = record.age_ranges.clone();
        sorted.sort_by(|a, b| a.days_from.total_cmp(&b.days_from));

        let mut merged: Vec<AgeRange> = Vec::new();
        for range in sorted {
            match merged.last_mut() {
                Some(current) if range.days_from <= current.range_to + AGE_RANGE_TOLERANCE_DAYS => {
                    current.range_to = current.range_to.max(range.days_to);
                }
                _ => merged.push(AgeRange {
                    range_from: range.days_from,
                    range_to: range.days_to,
                    unit: AGE_UNIT_DAYS.to_string(),
                }),
            }
        }
        Some(merged)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
