//! Benchmarks for the zone reconciliation engine
//!
//! Batch sizes cover a few weeks up to several years of logged exercise.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fitbridge::zones::{ProfileEstimator, ZoneCalculator, ZoneMapper, ZoneReconciler};
use fitbridge::{ActivityRecord, DailyMetric, HeartRateZone, UserProfile};

fn legacy_zones(seed: u32) -> Vec<HeartRateZone> {
    vec![
        HeartRateZone::new("Out of Range", 30, 98, seed % 40),
        HeartRateZone::new("Fat Burn", 98, 137, seed % 25),
        HeartRateZone::new("Cardio", 137, 166, seed % 15),
        HeartRateZone::new("Peak", 166, 220, seed % 7),
    ]
}

fn create_activities(count: usize) -> Vec<ActivityRecord> {
    let first_day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let start = (first_day + chrono::Duration::days(i as i64))
                .and_hms_opt(7, 0, 0)
                .unwrap();
            let mut activity = ActivityRecord::new(i as i64 + 1, "Run", start);
            activity.duration_ms = 45 * 60_000;
            activity.max_heart_rate = Some(170 + (i % 20) as u16);
            activity.heart_rate_zones = legacy_zones(i as u32);
            activity
        })
        .collect()
}

fn create_daily_metrics(count: usize) -> Vec<DailyMetric> {
    let first_day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let mut metric = DailyMetric::new(first_day + chrono::Duration::days(i as i64));
            metric.resting_heart_rate = Some(55 + (i % 10) as u16);
            metric
        })
        .collect()
}

fn bench_zone_calculation(c: &mut Criterion) {
    let calculator = ZoneCalculator::new(UserProfile {
        max_heart_rate: Some(190),
        resting_heart_rate: Some(60),
        ..UserProfile::default()
    });

    let mut group = c.benchmark_group("Zone Calculation");
    group.bench_function("karvonen", |b| {
        b.iter(|| calculator.karvonen_zones(black_box(190), black_box(60)))
    });
    group.bench_function("percentage", |b| {
        b.iter(|| calculator.percentage_zones(black_box(190)))
    });
    group.bench_function("legacy_mapping", |b| {
        let zones = legacy_zones(17);
        b.iter(|| ZoneMapper::map_legacy_zones(black_box(&zones)))
    });
    group.finish();
}

fn bench_profile_estimation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Profile Estimation");

    for &size in &[30, 365, 1825] {
        let activities = create_activities(size);
        let metrics = create_daily_metrics(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("estimate", size), &size, |b, _| {
            b.iter(|| ProfileEstimator::estimate(black_box(&activities), black_box(&metrics)))
        });
    }

    group.finish();
}

fn bench_batch_reconciliation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch Reconciliation");

    for &size in &[30, 365, 1825] {
        let activities = create_activities(size);
        let profile = ProfileEstimator::estimate(&activities, &create_daily_metrics(size));
        let reconciler = ZoneReconciler::new(profile);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("recalculate_all", size),
            &activities,
            |b, activities| {
                b.iter_batched(
                    || activities.clone(),
                    |mut batch| reconciler.recalculate_all(&mut batch),
                    criterion::BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_zone_calculation,
    bench_profile_estimation,
    bench_batch_reconciliation
);
criterion_main!(benches);
