//! GP practice transformer.
//!
//! Selection criteria:
//! - service type is GP Practice (100)
//! - the service has an ODS code
//! - the ODS code is one of A-H, J-N, P, V, W, Y followed by five digits
//!
//! Filter criteria:
//! - the service is active
//!
//! Produces an organisation, its location and a GP consultation service.

use lazy_static::lazy_static;
use regex::Regex;
use service_migration_shared::{
    HealthcareServiceCategory, HealthcareServiceType, LegacyServiceRecord, ServiceStatus,
};

use super::base::{ServiceClassification, ServiceMapper};
use super::validation::{validate_contact, validate_location, validate_public_name};
use super::{
    ensure_no_fatal_issues, Eligibility, ServiceTransformer, TransformationResult, ValidationIssue,
};
use crate::errors::TransformError;

pub const GP_PRACTICE_TYPE_ID: i64 = 100;

lazy_static! {
    static ref GP_PRACTICE_ODS_CODE_REGEX: Regex =
        Regex::new(r"^[ABCDEFGHJKLMNPVWY][0-9]{5}$").unwrap();
}

pub struct GpPracticeTransformer {
    mapper: ServiceMapper,
}

impl GpPracticeTransformer {
    pub fn new(mapper: ServiceMapper) -> Self {
        Self { mapper }
    }
}

impl ServiceTransformer for GpPracticeTransformer {
    fn name(&self) -> &'static str {
        "gp_practice"
    }

    fn is_supported(&self, record: &LegacyServiceRecord) -> Eligibility {
        if record.type_id != GP_PRACTICE_TYPE_ID {
            return Eligibility::ineligible("Service type is not GP Practice (100)");
        }
        let Some(ods_code) = record.ods_code() else {
            return Eligibility::ineligible("Service does not have an ODS code");
        };
        if !GP_PRACTICE_ODS_CODE_REGEX.is_match(ods_code) {
            return Eligibility::ineligible("ODS code does not match the required format");
        }
        Eligibility::Eligible
    }

    fn should_include(&self, record: &LegacyServiceRecord) -> Eligibility {
        if record.status() != Some(ServiceStatus::Active) {
            return Eligibility::ineligible("Service is not active");
        }
        Eligibility::Eligible
    }

    fn transform(
        &self,
        record: &LegacyServiceRecord,
        issues: &mut Vec<ValidationIssue>,
    ) -> Result<TransformationResult, TransformError> {
        self.is_supported(record).into_precondition()?;

        let contact = validate_contact(record, issues);
        let public_name = validate_public_name(record.public_name.as_deref());
        issues.extend(public_name.issues);
        let location = validate_location(
            record.address.as_deref(),
            record.town.as_deref(),
            record.postcode.as_deref(),
        );
        issues.extend(location.issues);
        ensure_no_fatal_issues(issues)?;

        let address = location
            .sanitised
            .ok_or_else(|| TransformError::precondition("Location address could not be built"))?;
        let audit = self.mapper.audit();

        let organisation = self.mapper.build_organisation(
            record,
            public_name.sanitised.unwrap_or_else(|| record.name.clone()),
            &contact,
            &audit,
        )?;
        let location = self
            .mapper
            .build_location(record, organisation.id, address, &audit);
        let healthcare_service = self.mapper.build_healthcare_service(
            record,
            ServiceClassification {
                category: HealthcareServiceCategory::GpServices,
                service_type: HealthcareServiceType::GpConsultationService,
            },
            Some(organisation.id),
            Some(location.id),
            &contact,
            &audit,
        );

        Ok(TransformationResult {
            organisation: Some(organisation),
            location: Some(location),
            healthcare_service: Some(healthcare_service),
            validation_issues: Vec::new(),
        })
    }
}
