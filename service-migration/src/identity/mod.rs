//! Deterministic identity mapping from legacy ids to canonical UUIDs.
//!
//! Every canonical id is a UUID v5 over a fixed root namespace and the name
//! `"{namespace}-{legacy_id}"`. Re-processing a legacy record therefore always
//! yields the same ids, which is what makes canonical upserts idempotent.

use uuid::Uuid;

/// Root namespace for every generated id.
pub const ROOT_NAMESPACE: Uuid = Uuid::from_u128(0xfa3aaa15_9f83_4f4a_8f86_fd1315248bcb);

pub const ORGANISATION_NAMESPACE: &str = "organisation";
pub const LOCATION_NAMESPACE: &str = "location";
pub const HEALTHCARE_SERVICE_NAMESPACE: &str = "healthcare_service";
pub const ENDPOINT_NAMESPACE: &str = "endpoint";

/// Maps `(namespace, legacy id)` pairs onto canonical UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl IdentityMapper {
    pub fn new() -> Self {
        Self
    }

    /// Generate the canonical id for a legacy id within an entity namespace.
    ///
    /// Pure: equal inputs always produce the same UUID. Any `i64` is accepted,
    /// including zero and negative values.
    pub fn generate(&self, namespace: &str, legacy_id: i64) -> Uuid {
        let name = format!("{namespace}-{legacy_id}");
        Uuid::new_v5(&ROOT_NAMESPACE, name.as_bytes())
    }

    pub fn organisation_id(&self, legacy_id: i64) -> Uuid {
        self.generate(ORGANISATION_NAMESPACE, legacy_id)
    }

    pub fn location_id(&self, legacy_id: i64) -> Uuid {
        self.generate(LOCATION_NAMESPACE, legacy_id)
    }

    pub fn healthcare_service_id(&self, legacy_id: i64) -> Uuid {
        self.generate(HEALTHCARE_SERVICE_NAMESPACE, legacy_id)
    }

    pub fn endpoint_id(&self, legacy_id: i64) -> Uuid {
        self.generate(ENDPOINT_NAMESPACE, legacy_id)
    }
}
