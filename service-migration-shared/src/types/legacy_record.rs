//! Legacy service directory record types.
//!
//! A `LegacyServiceRecord` is a read-only snapshot of one row of the legacy
//! `services` table together with every child row the transformers need.
//! Records are loaded fresh for each sync pass and never written back.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a legacy service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceStatus {
    Active,
    Closed,
    Commissioning,
}

impl ServiceStatus {
    /// Numeric identifier used by the legacy `statusid` column.
    pub const fn id(self) -> i64 {
        match self {
            Self::Active => 1,
            Self::Closed => 2,
            Self::Commissioning => 3,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Active),
            2 => Some(Self::Closed),
            3 => Some(Self::Commissioning),
            _ => None,
        }
    }
}

/// One legacy service with its linked sub-rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyServiceRecord {
    pub id: i64,
    pub uid: String,
    pub type_id: i64,
    pub status_id: i64,
    pub name: String,
    pub public_name: Option<String>,
    pub ods_code: Option<String>,
    pub email: Option<String>,
    pub public_phone: Option<String>,
    pub non_public_phone: Option<String>,
    pub fax: Option<String>,
    pub web: Option<String>,
    pub address: Option<String>,
    pub town: Option<String>,
    pub postcode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_time: Option<NaiveDateTime>,
    pub modified_time: Option<NaiveDateTime>,
    pub open_all_hours: bool,
    #[serde(default)]
    pub endpoints: Vec<LegacyEndpoint>,
    #[serde(default)]
    pub day_openings: Vec<LegacyDayOpening>,
    #[serde(default)]
    pub specified_openings: Vec<LegacySpecifiedOpening>,
    #[serde(default)]
    pub sgsds: Vec<LegacySgsd>,
    #[serde(default)]
    pub disposition_ids: Vec<i64>,
    #[serde(default)]
    pub age_ranges: Vec<LegacyAgeRange>,
}

impl LegacyServiceRecord {
    pub fn status(&self) -> Option<ServiceStatus> {
        ServiceStatus::from_id(self.status_id)
    }

    /// The ODS code with surrounding whitespace removed, if one is present.
    pub fn ods_code(&self) -> Option<&str> {
        self.ods_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// The postcode with surrounding whitespace removed, if one is present.
    pub fn postcode(&self) -> Option<&str> {
        self.postcode
            .as_deref()
            .map(str::trim)
            .filter(|postcode| !postcode.is_empty())
    }
}

/// A messaging endpoint attached to a legacy service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyEndpoint {
    pub id: i64,
    pub order: Option<i64>,
    pub transport: Option<String>,
    pub format: Option<String>,
    pub interaction: Option<String>,
    pub business_scenario: Option<String>,
    pub address: Option<String>,
    pub compression: Option<String>,
    pub comment: Option<String>,
}

/// A weekly opening session.
///
/// `day_id` refers to the opening-time day metadata; the `BankHoliday` day
/// marks a public-holiday session rather than a weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyDayOpening {
    pub service_id: i64,
    pub day_id: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// A date-specific opening override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySpecifiedOpening {
    pub service_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_closed: bool,
}

/// Symptom group / symptom discriminator link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacySgsd {
    pub sg_id: i64,
    pub sd_id: i64,
}

/// Age range expressed in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyAgeRange {
    pub days_from: f64,
    pub days_to: f64,
}

/// Restricts which legacy records a full scan visits.
///
/// An empty list places no restriction on that column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyRecordFilter {
    pub type_ids: Vec<i64>,
    pub status_ids: Vec<i64>,
}

impl LegacyRecordFilter {
    pub fn matches(&self, record: &LegacyServiceRecord) -> bool {
        (self.type_ids.is_empty() || self.type_ids.contains(&record.type_id))
            && (self.status_ids.is_empty() || self.status_ids.contains(&record.status_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_id() {
        for status in [
            ServiceStatus::Active,
            ServiceStatus::Closed,
            ServiceStatus::Commissioning,
        ] {
            assert_eq!(ServiceStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(ServiceStatus::from_id(99), None);
    }

    #[test]
    fn test_ods_code_trims_and_drops_blank() {
        let mut record = LegacyServiceRecord {
            ods_code: Some("  A12345 ".to_string()),
            ..Default::default()
        };
        assert_eq!(record.ods_code(), Some("A12345"));

        record.ods_code = Some("   ".to_string());
        assert_eq!(record.ods_code(), None);
    }

    #[test]
    fn test_filter_matches() {
        let record = LegacyServiceRecord {
            type_id: 100,
            status_id: 1,
            ..Default::default()
        };

        assert!(LegacyRecordFilter::default().matches(&record));
        assert!(LegacyRecordFilter {
            type_ids: vec![100, 136],
            status_ids: vec![],
        }
        .matches(&record));
        assert!(!LegacyRecordFilter {
            type_ids: vec![136],
            status_ids: vec![],
        }
        .matches(&record));
        assert!(!LegacyRecordFilter {
            type_ids: vec![],
            status_ids: vec![2],
        }
        .matches(&record));
    }
}
