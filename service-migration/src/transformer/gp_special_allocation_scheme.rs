//! GP special allocation scheme (SAS) transformer.
//!
//! Selection criteria:
//! - service type is GP Practice (100)
//! - the ODS code is a letter followed by five digits
//! - the name mentions `SAS` or `Special Allocation Scheme`
//!
//! Filter criteria:
//! - the service is active
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

pub const SAS_TYPE_ID: i64 = 100;

lazy_static! {
    static ref SAS_ODS_CODE_REGEX: Regex = Regex::new(r"^[A-Z][0-9]{5}$").unwrap();
}

pub struct GpSpecialAllocationSchemeTransformer {
    mapper: ServiceMapper,
}

impl GpSpecialAllocationSchemeTransformer {
    pub fn new(mapper: ServiceMapper) -> Self {
        Self { mapper }
    }
}

fn mentions_sas(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("sas") || name.contains("special allocation scheme")
}

impl ServiceTransformer for GpSpecialAllocationSchemeTransformer {
    fn name(&self) -> &'static str {
        "gp_special_allocation_scheme"
    }

    fn is_supported(&self, record: &LegacyServiceRecord) -> Eligibility {
        if record.type_id != SAS_TYPE_ID {
            return Eligibility::ineligible(format!(
                "Service typeid {} is not supported",
                record.type_id
            ));
        }
        let Some(ods_code) = record.ods_code() else {
            return Eligibility::ineligible("Service does not have an ODS code");
        };
        if !SAS_ODS_CODE_REGEX.is_match(ods_code) {
            return Eligibility::ineligible(
                "ODS code does not match the required format (6 chars, 1 letter + 5 digits)",
            );
        }
        if !mentions_sas(&record.name) {
            return Eligibility::ineligible(
                "Service name does not contain 'SAS' or 'Special Allocation Scheme'",
            );
        }
        Eligibility::Eligible
    }

    fn should_include(&self, record: &LegacyServiceRecord) -> Eligibility {
        if record.status() != Some(ServiceStatus::Active) {
            return Eligibility::ineligible("Service is not 'active'");
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
        ensure_no_fatal_issues(issues)?;

        let healthcare_service = self.mapper.build_healthcare_service(
            record,
            ServiceClassification {
                category: HealthcareServiceCategory::GpServices,
                service_type: HealthcareServiceType::GpSpecialAllocationSchemeService,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityMapper;
    use service_migration_shared::MetadataCache;
    use std::sync::Arc;

    fn transformer() -> GpSpecialAllocationSchemeTransformer {
        GpSpecialAllocationSchemeTransformer::new(ServiceMapper::new(
            IdentityMapper::new(),
            Arc::new(MetadataCache::default()),
        ))
    }

    fn sas_record() -> LegacyServiceRecord {
        LegacyServiceRecord {
            id: 500001,
            uid: "500001".to_string(),
            type_id: 100,
            status_id: 1,
            name: "Special Allocation Scheme - Leeds".to_string(),
            ods_code: Some("Z12345".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_supported() {
        let transformer = transformer();
        assert!(transformer.is_supported(&sas_record()).is_eligible());

        let long_ods = LegacyServiceRecord {
            ods_code: Some("Z123456".to_string()),
            ..sas_record()
        };
        assert_eq!(
            transformer.is_supported(&long_ods).reason(),
            Some("ODS code does not match the required format (6 chars, 1 letter + 5 digits)")
        );

        let plain_name = LegacyServiceRecord {
            name: "Leeds Surgery".to_string(),
            ..sas_record()
        };
        assert_eq!(
            transformer.is_supported(&plain_name).reason(),
            Some("Service name does not contain 'SAS' or 'Special Allocation Scheme'")
        );
    }

    #[test]
    fn test_should_include_only_active() {
        let transformer = transformer();
        let commissioning = LegacyServiceRecord {
            status_id: 3,
            ..sas_record()
        };
        assert_eq!(
            transformer.should_include(&commissioning).reason(),
            Some("Service is not 'active'")
        );
    }

    #[test]
    fn test_transform_flags_bad_contact_details() {
        let record = LegacyServiceRecord {
            email: Some("sas at nhs".to_string()),
            ..sas_record()
        };
        let mut issues = Vec::new();

        let result = transformer().transform(&record, &mut issues).unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "invalid_email");
        let service = result.healthcare_service.unwrap();
        assert_eq!(
            service.service_type,
            HealthcareServiceType::GpSpecialAllocationSchemeService
        );
        assert_eq!(service.telecom.unwrap().email, None);
    }
}
