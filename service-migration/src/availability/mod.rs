//! Aggregation of legacy scheduling rows into canonical availability.
//!
//! The legacy directory spreads a service's schedule across weekly opening
//! rows (including a `BankHoliday` pseudo-day) and date-specific overrides.
//! [`AvailabilityAggregator`] groups those rows per service and emits the four
//! availability categories, with an empty list for any category a service has
//! no rows for.

use chrono::{NaiveDate, NaiveTime};
use service_migration_shared::{
    AvailabilityEntry, DayOfWeek, LegacyDayOpening, LegacySpecifiedOpening, MetadataCache,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Description attached to every date-specific opening.
pub const VARIATION_DESCRIPTION: &str = "special";

/// Description attached to every date-specific closure.
pub const NOT_AVAILABLE_DESCRIPTION: &str = "From Live";

/// Start of an all-day session.
pub const START_OF_DAY: NaiveTime = NaiveTime::MIN;

/// Legacy end time that marks a session running to the end of the day.
pub const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 0) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// The four availability categories for one service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceAvailability {
    pub available_time: Vec<AvailabilityEntry>,
    pub public_holidays: Vec<AvailabilityEntry>,
    pub variations: Vec<AvailabilityEntry>,
    pub not_available: Vec<AvailabilityEntry>,
}

impl ServiceAvailability {
    /// Flatten into one list: weekly, public holiday, variations, closures.
    pub fn into_entries(self) -> Vec<AvailabilityEntry> {
        let mut entries = self.available_time;
        entries.extend(self.public_holidays);
        entries.extend(self.variations);
        entries.extend(self.not_available);
        entries
    }
}

/// Merges weekly, holiday and date-override rows into availability entries.
#[derive(Debug, Clone)]
pub struct AvailabilityAggregator {
    metadata: Arc<MetadataCache>,
}

impl AvailabilityAggregator {
    pub fn new(metadata: Arc<MetadataCache>) -> Self {
        Self { metadata }
    }

    /// Group every row by service id and build each service's availability.
    ///
    /// Every service that appears in either input is present in the result
    /// with all four categories populated (possibly empty).
    pub fn aggregate(
        &self,
        day_rows: &[LegacyDayOpening],
        date_override_rows: &[LegacySpecifiedOpening],
    ) -> BTreeMap<i64, ServiceAvailability> {
        let mut weekly: BTreeMap<(i64, DayOfWeek), Vec<(NaiveTime, NaiveTime)>> = BTreeMap::new();
        let mut holidays: BTreeMap<i64, (NaiveTime, NaiveTime)> = BTreeMap::new();

        for row in day_rows {
            if self.metadata.is_bank_holiday(row.day_id) {
                holidays
                    .entry(row.service_id)
                    .or_insert((row.start_time, row.end_time));
                continue;
            }

            let day = self
                .metadata
                .day_name(row.day_id)
                .and_then(DayOfWeek::from_day_name);
            match day {
                Some(day) => weekly
                    .entry((row.service_id, day))
                    .or_default()
                    .push((row.start_time, row.end_time)),
                None => warn!(
                    service_id = row.service_id,
                    day_id = row.day_id,
                    "Skipping opening time with unknown day"
                ),
            }
        }

        let mut variations: BTreeMap<(i64, NaiveDate, NaiveTime), NaiveTime> = BTreeMap::new();
        let mut closures: BTreeSet<(i64, NaiveDate)> = BTreeSet::new();

        for row in date_override_rows {
            if row.is_closed {
                closures.insert((row.service_id, row.date));
            } else {
                variations
                    .entry((row.service_id, row.date, row.start_time))
                    .or_insert(row.end_time);
            }
        }

        let mut services: BTreeMap<i64, ServiceAvailability> = BTreeMap::new();

        for ((service_id, day), sessions) in weekly {
            let availability = services.entry(service_id).or_default();
            let mut seen = HashSet::new();
            for (start, end) in sessions {
                if !seen.insert((start, end)) {
                    continue;
                }
                let entry = if start == START_OF_DAY && end == END_OF_DAY {
                    AvailabilityEntry::all_day(day)
                } else {
                    AvailabilityEntry::available_time(day, start, end)
                };
                availability.available_time.push(entry);
            }
        }

        for (service_id, (start, end)) in holidays {
            services
                .entry(service_id)
                .or_default()
                .public_holidays
                .push(AvailabilityEntry::AvailableTimePublicHolidays {
                    start_time: start,
                    end_time: end,
                });
        }

        for ((service_id, date, start), end) in variations {
            services
                .entry(service_id)
                .or_default()
                .variations
                .push(AvailabilityEntry::AvailableTimeVariation {
                    description: VARIATION_DESCRIPTION.to_string(),
                    start_time: date.and_time(start),
                    end_time: date.and_time(end),
                });
        }

        for (service_id, date) in closures {
            services
                .entry(service_id)
                .or_default()
                .not_available
                .push(AvailabilityEntry::NotAvailable {
                    date,
                    description: NOT_AVAILABLE_DESCRIPTION.to_string(),
                });
        }

        services
    }

    /// Aggregate and flatten every service's entries, in service id order.
    pub fn merge(
        &self,
        day_rows: &[LegacyDayOpening],
        date_override_rows: &[LegacySpecifiedOpening],
    ) -> Vec<AvailabilityEntry> {
        self.aggregate(day_rows, date_override_rows)
            .into_values()
            .flat_map(ServiceAvailability::into_entries)
            .collect()
    }

    /// Availability entries for one service, empty when it has no rows.
    pub fn for_service(
        &self,
        service_id: i64,
        day_rows: &[LegacyDayOpening],
        date_override_rows: &[LegacySpecifiedOpening],
    ) -> Vec<AvailabilityEntry> {
        self.aggregate(day_rows, date_override_rows)
            .remove(&service_id)
            .map(ServiceAvailability::into_entries)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_migration_shared::BANK_HOLIDAY_DAY_NAME;

    const MONDAY: i64 = 1;
    const TUESDAY: i64 = 2;
    const BANK_HOLIDAY: i64 = 8;

    fn aggregator() -> AvailabilityAggregator {
        let metadata = MetadataCache::default()
            .with_opening_time_day(MONDAY, "Monday")
            .with_opening_time_day(TUESDAY, "Tuesday")
            .with_opening_time_day(BANK_HOLIDAY, BANK_HOLIDAY_DAY_NAME);
        AvailabilityAggregator::new(Arc::new(metadata))
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day_row(service_id: i64, day_id: i64, start: NaiveTime, end: NaiveTime) -> LegacyDayOpening {
        LegacyDayOpening {
            service_id,
            day_id,
            start_time: start,
            end_time: end,
        }
    }

    fn override_row(
        service_id: i64,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        is_closed: bool,
    ) -> LegacySpecifiedOpening {
        LegacySpecifiedOpening {
            service_id,
            date,
            start_time: start,
            end_time: end,
            is_closed,
        }
    }

    #[test]
    fn test_weekday_rows_and_all_day_collapse() {
        let rows = vec![
            day_row(1, MONDAY, time(9, 0), time(17, 0)),
            day_row(1, TUESDAY, time(0, 0), time(23, 59)),
        ];

        let entries = aggregator().merge(&rows, &[]);

        assert_eq!(
            entries,
            vec![
                AvailabilityEntry::available_time(DayOfWeek::Mon, time(9, 0), time(17, 0)),
                AvailabilityEntry::all_day(DayOfWeek::Tue),
            ]
        );
    }

    #[test]
    fn test_bank_holiday_only_in_holiday_entry() {
        let rows = vec![
            day_row(1, BANK_HOLIDAY, time(10, 0), time(14, 0)),
            day_row(1, BANK_HOLIDAY, time(15, 0), time(16, 0)),
            day_row(1, MONDAY, time(9, 0), time(17, 0)),
        ];

        let services = aggregator().aggregate(&rows, &[]);
        let availability = &services[&1];

        assert_eq!(availability.available_time.len(), 1);
        assert!(availability.available_time.iter().all(|entry| matches!(
            entry,
            AvailabilityEntry::AvailableTime { .. }
        )));
        assert_eq!(
            availability.public_holidays,
            vec![AvailabilityEntry::AvailableTimePublicHolidays {
                start_time: time(10, 0),
                end_time: time(14, 0),
            }]
        );
    }

    #[test]
    fn test_duplicate_sessions_are_suppressed() {
        let rows = vec![
            day_row(1, MONDAY, time(9, 0), time(12, 0)),
            day_row(1, MONDAY, time(9, 0), time(12, 0)),
            day_row(1, MONDAY, time(13, 0), time(17, 0)),
        ];

        let entries = aggregator().merge(&rows, &[]);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_date_overrides_split_into_variations_and_closures() {
        let christmas_eve = NaiveDate::from_ymd_opt(2025, 12, 24).unwrap();
        let christmas = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        let overrides = vec![
            override_row(1, christmas_eve, time(9, 0), time(12, 0), false),
            override_row(1, christmas_eve, time(9, 0), time(13, 0), false),
            override_row(1, christmas, time(0, 0), time(0, 0), true),
            override_row(1, christmas, time(8, 0), time(9, 0), true),
        ];

        let services = aggregator().aggregate(&[], &overrides);
        let availability = &services[&1];

        assert!(availability.available_time.is_empty());
        assert!(availability.public_holidays.is_empty());
        assert_eq!(
            availability.variations,
            vec![AvailabilityEntry::AvailableTimeVariation {
                description: VARIATION_DESCRIPTION.to_string(),
                start_time: christmas_eve.and_time(time(9, 0)),
                end_time: christmas_eve.and_time(time(12, 0)),
            }]
        );
        assert_eq!(
            availability.not_available,
            vec![AvailabilityEntry::NotAvailable {
                date: christmas,
                description: NOT_AVAILABLE_DESCRIPTION.to_string(),
            }]
        );
    }

    #[test]
    fn test_outer_join_across_services() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let rows = vec![day_row(1, MONDAY, time(9, 0), time(17, 0))];
        let overrides = vec![override_row(2, date, time(0, 0), time(0, 0), true)];

        let services = aggregator().aggregate(&rows, &overrides);

        assert_eq!(services.len(), 2);
        assert!(services[&1].not_available.is_empty());
        assert!(services[&2].available_time.is_empty());
        assert_eq!(services[&2].not_available.len(), 1);
    }

    #[test]
    fn test_closure_is_labelled_from_live() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        let overrides = vec![override_row(1, date, time(0, 0), time(0, 0), true)];

        let entries = aggregator().for_service(1, &[], &overrides);
        let value = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(value["category"], "notAvailable");
        assert_eq!(value["description"], "From Live");
    }

    #[test]
    fn test_sessions_differing_by_seconds_stay_distinct() {
        let rows = vec![
            day_row(1, MONDAY, time(9, 0), time(17, 0)),
            day_row(1, MONDAY, NaiveTime::from_hms_opt(9, 0, 30).unwrap(), time(17, 0)),
        ];

        let entries = aggregator().for_service(1, &rows, &[]);
        let starts: Vec<_> = entries
            .iter()
            .map(|entry| serde_json::to_value(entry).unwrap()["startTime"].clone())
            .collect();
        assert_eq!(starts, vec!["09:00:00", "09:00:30"]);
    }

    #[test]
    fn test_for_service_without_rows_is_empty() {
        let rows = vec![day_row(1, MONDAY, time(9, 0), time(17, 0))];
        assert!(aggregator().for_service(99, &rows, &[]).is_empty());
        assert_eq!(aggregator().for_service(1, &rows, &[]).len(), 1);
    }

    #[test]
    fn test_unknown_day_is_skipped() {
        let rows = vec![day_row(1, 42, time(9, 0), time(17, 0))];
        let services = aggregator().aggregate(&rows, &[]);
        assert!(services.is_empty());
    }
}
