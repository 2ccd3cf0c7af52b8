//! GP protected learning time (PLT) transformer.
//!
//! Selection criteria:
//! - service type is GP Practice (100), 136 or 159
//! - the service has a full-length ODS code (a letter followed by five or six digits)
//! - the name mentions `PLT` or `GP Cover`
//! - the service is linked to at least one SG/SD pair and has a postcode
//!
//! Filter criteria:
//! - the service is active or commissioning
//!
//! Produces a healthcare service only.

use lazy_static::lazy_static;
use regex::Regex;
use service_migration_shared::{
    HealthcareServiceCategory, HealthcareServiceType, LegacyServiceRecord, ServiceStatus,
};

use super::base::{ServiceClassification, ServiceMapper};
use super::validation::validate_contact;
use super::{
    ensure_no_fatal_issues, Eligibility, ServiceTransformer, TransformationResult, ValidationIssue,
};
use crate::errors::TransformError;

pub const PLT_TYPE_IDS: [i64; 3] = [100, 136, 159];

lazy_static! {
    static ref PLT_ODS_CODE_REGEX: Regex = Regex::new(r"^[A-Z][0-9]{5,6}$").unwrap();
}

pub struct GpProtectedLearningTimeTransformer {
    mapper: ServiceMapper,
}

impl GpProtectedLearningTimeTransformer {
    pub fn new(mapper: ServiceMapper) -> Self {
        Self { mapper }
    }
}

fn mentions_plt(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("plt") || name.contains("gp cover")
}

impl ServiceTransformer for GpProtectedLearningTimeTransformer {
    fn name(&self) -> &'static str {
        "gp_protected_learning_time"
    }

    fn is_supported(&self, record: &LegacyServiceRecord) -> Eligibility {
        if !PLT_TYPE_IDS.contains(&record.type_id) {
            return Eligibility::ineligible(format!(
                "Service typeid {} is not supported",
                record.type_id
            ));
        }
        let Some(ods_code) = record.ods_code() else {
            return Eligibility::ineligible("Service does not have an ODS code");
        };
        if !PLT_ODS_CODE_REGEX.is_match(ods_code) {
            return Eligibility::ineligible(
                "ODS code does not match the required format (full length)",
            );
        }
        if !mentions_plt(&record.name) {
            return Eligibility::ineligible(
                "Service name does not contain 'PLT' or 'GP Cover'",
            );
        }
        if record.sgsds.is_empty() || record.postcode().is_none() {
            return Eligibility::ineligible(
                "Profile must be linked to at least 1 SG code or contain a postcode",
            );
        }
        Eligibility::Eligible
    }

    fn should_include(&self, record: &LegacyServiceRecord) -> Eligibility {
        match record.status() {
            Some(ServiceStatus::Active) | Some(ServiceStatus::Commissioning) => {
                Eligibility::Eligible
            }
            _ => Eligibility::ineligible("Service is not 'active' or 'commissioning'"),
        }
    }

    fn transform(
        &self,
        record: &LegacyServiceRecord,
        issues: &mut Vec<ValidationIssue>,
    ) -> Result<TransformationResult, TransformError> {
        self.is_supported(record).into_precondition()?;

        let contact = validate_contact(record, issues);
        ensure_no_fatal_issues(issues)?;

        let healthcare_service = self.mapper.build_healthcare_service(
            record,
            ServiceClassification {
                category: HealthcareServiceCategory::GpServices,
                service_type: HealthcareServiceType::GpProtectedLearningTimeService,
            },
            None,
            None,
            &contact,
            &self.mapper.audit(),
        );

        Ok(TransformationResult {
            healthcare_service: Some(healthcare_service),
            ..Default::default()
        })
    }
}
