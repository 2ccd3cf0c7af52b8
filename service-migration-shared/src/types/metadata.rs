//! Reference data loaded from the legacy directory once per invocation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opening-time day name that marks a public-holiday session.
pub const BANK_HOLIDAY_DAY_NAME: &str = "BankHoliday";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// Lookup tables shared by every transformer in an invocation.
///
/// The cache is built once and handed to transformers behind an `Arc`, so it
/// is immutable after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataCache {
    service_types: HashMap<i64, String>,
    opening_time_days: HashMap<i64, String>,
    dispositions: HashMap<i64, Disposition>,
}

impl MetadataCache {
    pub fn new(
        service_types: HashMap<i64, String>,
        opening_time_days: HashMap<i64, String>,
        dispositions: HashMap<i64, Disposition>,
    ) -> Self {
        Self {
            service_types,
            opening_time_days,
            dispositions,
        }
    }

    pub fn with_service_type(mut self, id: i64, name: impl Into<String>) -> Self {
        self.service_types.insert(id, name.into());
        self
    }

    pub fn with_opening_time_day(mut self, id: i64, name: impl Into<String>) -> Self {
        self.opening_time_days.insert(id, name.into());
        self
    }

    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.dispositions.insert(disposition.id, disposition);
        self
    }

    pub fn service_type_name(&self, type_id: i64) -> Option<&str> {
        self.service_types.get(&type_id).map(String::as_str)
    }

    pub fn day_name(&self, day_id: i64) -> Option<&str> {
        self.opening_time_days.get(&day_id).map(String::as_str)
    }

    pub fn is_bank_holiday(&self, day_id: i64) -> bool {
        self.day_name(day_id) == Some(BANK_HOLIDAY_DAY_NAME)
    }

    pub fn disposition(&self, id: i64) -> Option<&Disposition> {
        self.dispositions.get(&id)
    }
}
