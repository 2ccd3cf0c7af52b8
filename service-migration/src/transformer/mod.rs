//! Rule-based mapping of legacy records onto canonical entities.
//!
//! Each service category the migration understands is a [`ServiceTransformer`].
//! The [`TransformerRegistry`] holds them in priority order and selects the
//! first one that supports a record; that transformer alone decides whether the
//! record is included and how it is mapped.

pub mod address;
pub mod base;
pub mod gp_practice;
pub mod gp_protected_learning_time;
pub mod gp_special_allocation_scheme;
pub mod registry;
pub mod validation;

pub use base::ServiceMapper;
pub use gp_practice::GpPracticeTransformer;
pub use gp_protected_learning_time::GpProtectedLearningTimeTransformer;
pub use gp_special_allocation_scheme::GpSpecialAllocationSchemeTransformer;
pub use registry::{Selection, TransformerRegistry};
pub use validation::{IssueSeverity, ValidationIssue};

use service_migration_shared::{
    CanonicalEntity, HealthcareService, LegacyServiceRecord, Location, Organisation,
};

use crate::errors::TransformError;

/// Answer to "does this transformer accept the record?", with the reason when it does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(String),
}

impl Eligibility {
    pub fn ineligible(reason: impl Into<String>) -> Self {
        Self::Ineligible(reason.into())
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Eligible => None,
            Self::Ineligible(reason) => Some(reason),
        }
    }

    /// Turn an ineligible answer into a precondition failure.
    pub fn into_precondition(self) -> Result<(), TransformError> {
        match self {
            Self::Eligible => Ok(()),
            Self::Ineligible(reason) => Err(TransformError::Precondition(reason)),
        }
    }
}

/// Output of one transform call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformationResult {
    pub organisation: Option<Organisation>,
    pub location: Option<Location>,
    pub healthcare_service: Option<HealthcareService>,
    pub validation_issues: Vec<ValidationIssue>,
}

impl TransformationResult {
    pub fn with_issues(mut self, issues: Vec<ValidationIssue>) -> Self {
        self.validation_issues = issues;
        self
    }

    /// Produced entities in write order: organisation, location, service.
    pub fn entities(&self) -> Vec<CanonicalEntity> {
        let mut entities = Vec::with_capacity(3);
        if let Some(organisation) = &self.organisation {
            entities.push(CanonicalEntity::Organisation(organisation.clone()));
        }
        if let Some(location) = &self.location {
            entities.push(CanonicalEntity::Location(location.clone()));
        }
        if let Some(service) = &self.healthcare_service {
            entities.push(CanonicalEntity::HealthcareService(service.clone()));
        }
        entities
    }
}

/// One service category's selection, inclusion and mapping rules.
pub trait ServiceTransformer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the record belongs to this transformer's category.
    fn is_supported(&self, record: &LegacyServiceRecord) -> Eligibility;

    /// Whether a supported record should be migrated now.
    fn should_include(&self, record: &LegacyServiceRecord) -> Eligibility;

    /// Map the record. Non-fatal issues are appended to `issues`.
    fn transform(
        &self,
        record: &LegacyServiceRecord,
        issues: &mut Vec<ValidationIssue>,
    ) -> Result<TransformationResult, TransformError>;
}

/// Fail with the first fatal issue, if any.
pub(crate) fn ensure_no_fatal_issues(issues: &[ValidationIssue]) -> Result<(), TransformError> {
    match issues.iter().find(|issue| issue.is_fatal()) {
        Some(issue) => Err(TransformError::Validation {
            code: issue.code.clone(),
            diagnostics: issue.diagnostics.clone(),
        }),
        None => Ok(()),
    }
}
