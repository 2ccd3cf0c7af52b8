//! Priority-ordered transformer selection.

use service_migration_shared::{LegacyServiceRecord, MetadataCache};
use std::sync::Arc;

use super::base::ServiceMapper;
use super::{
    Eligibility, GpPracticeTransformer, GpProtectedLearningTimeTransformer,
    GpSpecialAllocationSchemeTransformer, ServiceTransformer,
};
use crate::identity::IdentityMapper;

/// How the registry resolved a record.
pub enum Selection<'a> {
    /// No transformer supports the record. Holds each transformer's rejection reason.
    Unsupported { reasons: Vec<(&'static str, String)> },
    /// The selected transformer excluded the record.
    Excluded {
        transformer: &'a dyn ServiceTransformer,
        reason: String,
    },
    Selected(&'a dyn ServiceTransformer),
}

/// Ordered list of transformers; the first that supports a record wins.
#[derive(Default)]
pub struct TransformerRegistry {
    transformers: Vec<Arc<dyn ServiceTransformer>>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The production transformer set: PLT, then SAS, then GP practice.
    pub fn with_default_transformers(metadata: Arc<MetadataCache>) -> Self {
        let mapper = ServiceMapper::new(IdentityMapper::new(), metadata);
        let mut registry = Self::new();
        registry.register(Arc::new(GpProtectedLearningTimeTransformer::new(
            mapper.clone(),
        )));
        registry.register(Arc::new(GpSpecialAllocationSchemeTransformer::new(
            mapper.clone(),
        )));
        registry.register(Arc::new(GpPracticeTransformer::new(mapper)));
        registry
    }

    /// Append a transformer at the lowest priority.
    pub fn register(&mut self, transformer: Arc<dyn ServiceTransformer>) {
        self.transformers.push(transformer);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Resolve a record against the registered transformers.
    ///
    /// Selection is exclusive: once a transformer supports the record, later
    /// transformers are never consulted, even when the selected one excludes it.
    pub fn select(&self, record: &LegacyServiceRecord) -> Selection<'_> {
        let mut reasons = Vec::new();

        for transformer in &self.transformers {
            match transformer.is_supported(record) {
                Eligibility::Eligible => {
                    return match transformer.should_include(record) {
                        Eligibility::Eligible => Selection::Selected(transformer.as_ref()),
                        Eligibility::Ineligible(reason) => Selection::Excluded {
                            transformer: transformer.as_ref(),
                            reason,
                        },
                    };
                }
                Eligibility::Ineligible(reason) => reasons.push((transformer.name(), reason)),
            }
        }

        Selection::Unsupported { reasons }
    }
}
