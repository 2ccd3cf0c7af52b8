//! Benchmarks for availability aggregation
//!
//! Run with: cargo bench -p service-migration --bench availability

use chrono::{NaiveDate, NaiveTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use service_migration::availability::AvailabilityAggregator;
use service_migration_shared::{
    LegacyDayOpening, LegacySpecifiedOpening, MetadataCache, BANK_HOLIDAY_DAY_NAME,
};
use std::sync::Arc;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const BANK_HOLIDAY: i64 = 8;

fn metadata() -> MetadataCache {
    DAY_NAMES
        .iter()
        .zip(1..)
        .fold(MetadataCache::default(), |cache, (name, id)| {
            cache.with_opening_time_day(id, *name)
        })
        .with_opening_time_day(BANK_HOLIDAY, BANK_HOLIDAY_DAY_NAME)
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Two sessions per weekday, a holiday session and a few date overrides per service.
fn rows(services: i64) -> (Vec<LegacyDayOpening>, Vec<LegacySpecifiedOpening>) {
    let mut day_rows = Vec::new();
    let mut override_rows = Vec::new();
    let base = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap_or_default();

    for service_id in 1..=services {
        for day_id in 1..=5 {
            day_rows.push(LegacyDayOpening {
                service_id,
                day_id,
                start_time: time(8, 0),
                end_time: time(12, 30),
            });
            day_rows.push(LegacyDayOpening {
                service_id,
                day_id,
                start_time: time(13, 30),
                end_time: time(18, 0),
            });
        }
        day_rows.push(LegacyDayOpening {
            service_id,
            day_id: 6,
            start_time: time(0, 0),
            end_time: time(23, 59),
        });
        day_rows.push(LegacyDayOpening {
            service_id,
            day_id: BANK_HOLIDAY,
            start_time: time(10, 0),
            end_time: time(14, 0),
        });

        for offset in 0..4 {
            override_rows.push(LegacySpecifiedOpening {
                service_id,
                date: base + chrono::Duration::days(offset),
                start_time: time(9, 0),
                end_time: time(13, 0),
                is_closed: offset % 2 == 0,
            });
        }
    }

    (day_rows, override_rows)
}

fn bench_aggregate(c: &mut Criterion) {
    let aggregator = AvailabilityAggregator::new(Arc::new(metadata()));
    let mut group = c.benchmark_group("availability_aggregate");

    for services in [10_i64, 100, 1_000] {
        let (day_rows, override_rows) = rows(services);
        group.throughput(Throughput::Elements((day_rows.len() + override_rows.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(services), &services, |b, _| {
            b.iter(|| aggregator.merge(black_box(&day_rows), black_box(&override_rows)))
        });
    }

    group.finish();
}

fn bench_single_service(c: &mut Criterion) {
    let aggregator = AvailabilityAggregator::new(Arc::new(metadata()));
    let (day_rows, override_rows) = rows(1);

    c.bench_function("availability_for_service", |b| {
        b.iter(|| aggregator.for_service(black_box(1), &day_rows, &override_rows))
    });
}

criterion_group!(benches, bench_aggregate, bench_single_service);
criterion_main!(benches);
