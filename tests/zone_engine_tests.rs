//! Zone reconciliation engine, exercised through the public API

use chrono::NaiveDate;
use proptest::prelude::*;

use fitbridge::zones::{
    redistribute_zone_time, MaxHrFormula, ProfileEstimator, ZoneCalculator, ZoneMapper,
    ZoneReconciler, ZoneSystem, ZoneValidator,
};
use fitbridge::{ActivityRecord, DailyMetric, FitnessLevel, HeartRateZone, UserProfile};

fn activity_on(log_id: i64, day: u32, max_hr: Option<u16>) -> ActivityRecord {
    let start = NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap();
    let mut activity = ActivityRecord::new(log_id, "Run", start);
    activity.duration_ms = 45 * 60_000;
    activity.max_heart_rate = max_hr;
    activity
}

fn resting_on(day: u32, bpm: Option<u16>) -> DailyMetric {
    let mut metric = DailyMetric::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap());
    metric.resting_heart_rate = bpm;
    metric
}

fn legacy_zones() -> Vec<HeartRateZone> {
    vec![
        HeartRateZone::new("Out of Range", 30, 98, 0),
        HeartRateZone::new("Fat Burn", 98, 137, 20),
        HeartRateZone::new("Cardio", 137, 166, 10),
        HeartRateZone::new("Peak", 166, 220, 5),
    ]
}

fn minutes(zones: &[HeartRateZone]) -> Vec<u32> {
    zones.iter().map(|z| z.minutes).collect()
}

#[test]
fn test_profile_estimation_from_data_set() {
    // 16 active days out of 31
    let activities: Vec<_> = (1..=31)
        .step_by(2)
        .map(|day| activity_on(i64::from(day), day, Some(170 + day as u16)))
        .collect();
    let daily = vec![
        resting_on(1, Some(60)),
        resting_on(2, Some(63)),
        resting_on(3, Some(0)),
        resting_on(4, None),
    ];

    let profile = ProfileEstimator::estimate(&activities, &daily);

    assert_eq!(profile.resting_heart_rate, Some(61));
    assert_eq!(profile.max_heart_rate, Some(201));
    assert_eq!(profile.fitness_level, Some(FitnessLevel::Advanced));
    assert_eq!(profile.age, None);
}

#[test]
fn test_fitness_level_thresholds() {
    // 2 of 8 days
    let sparse = vec![activity_on(1, 1, None), activity_on(2, 8, None)];
    assert_eq!(
        ProfileEstimator::estimate(&sparse, &[]).fitness_level,
        Some(FitnessLevel::Intermediate)
    );

    let rare = vec![activity_on(1, 1, None), activity_on(2, 20, None)];
    assert_eq!(
        ProfileEstimator::estimate(&rare, &[]).fitness_level,
        Some(FitnessLevel::Beginner)
    );

    assert!(ProfileEstimator::estimate(&[], &[]).is_empty());
}

#[test]
fn test_fitness_level_at_half_of_days() {
    let days = |active: &[u32]| -> Vec<ActivityRecord> {
        active
            .iter()
            .map(|day| activity_on(i64::from(*day), *day, None))
            .collect()
    };

    // 10 of 20 days is not above one half
    let mut half: Vec<u32> = (1..=9).collect();
    half.push(20);
    assert_eq!(
        ProfileEstimator::estimate(&days(&half), &[]).fitness_level,
        Some(FitnessLevel::Intermediate)
    );

    let mut eleven: Vec<u32> = (1..=10).collect();
    eleven.push(20);
    assert_eq!(
        ProfileEstimator::estimate(&days(&eleven), &[]).fitness_level,
        Some(FitnessLevel::Advanced)
    );
}

#[test]
fn test_estimation_is_repeatable() {
    let activities = vec![activity_on(1, 3, Some(176)), activity_on(2, 9, Some(181))];
    let daily = vec![resting_on(3, Some(57)), resting_on(9, Some(64))];

    let first = ProfileEstimator::estimate(&activities, &daily);
    let second = ProfileEstimator::estimate(&activities, &daily);
    assert_eq!(first, second);
}

#[test]
fn test_age_only_profile_uses_formula() {
    let profile = UserProfile {
        age: Some(40),
        ..UserProfile::default()
    };

    let tanaka = ZoneCalculator::new(profile).calculate_zones().unwrap();
    // 208 - 28 = 180
    assert_eq!(tanaka[4].max_bpm, 180);
    assert_eq!(tanaka[0].min_bpm, 90);

    let fox = ZoneCalculator::new(profile)
        .with_formula(MaxHrFormula::Fox)
        .calculate_zones()
        .unwrap();
    assert_eq!(fox[4].max_bpm, 180);
    assert_eq!(fox[0].min_bpm, 90);

    let nes = ZoneCalculator::new(profile)
        .with_formula(MaxHrFormula::Nes)
        .calculate_zones()
        .unwrap();
    // 211 - 25.6 = 185.4
    assert_eq!(nes[4].max_bpm, 185);
}

#[test]
fn test_reconciler_karvonen_with_recorded_zones() {
    let reconciler = ZoneReconciler::new(UserProfile {
        max_heart_rate: Some(190),
        resting_heart_rate: Some(60),
        ..UserProfile::default()
    })
    .with_zone_system(ZoneSystem::FiveZone);

    let mut run = activity_on(7, 7, Some(188));
    run.heart_rate_zones = legacy_zones();

    let outcome = reconciler.recalculate_activity(&mut run).unwrap();
    assert!(outcome.method.is_some());

    let zones = &run.recalculated_hr_zones;
    assert_eq!(zones.len(), 5);
    assert_eq!(zones[0].name, "Recovery");
    assert_eq!(zones[4].garmin_zone_name.as_deref(), Some("Zone 5"));
    // four recorded zones copied, the fifth gets half of the first
    assert_eq!(minutes(zones), vec![0, 20, 10, 5, 0]);

    // recorded zones are left as they were
    assert_eq!(run.heart_rate_zones, legacy_zones());
    assert_eq!(run.export_zones(), zones.as_slice());
}

#[test]
fn test_mapper_then_validator() {
    let mapped = ZoneMapper::map_legacy_zones(&legacy_zones());

    assert_eq!(minutes(&mapped), vec![12, 8, 5, 5, 5]);
    assert_eq!((mapped[0].min_bpm, mapped[0].max_bpm), (98, 137));
    assert_eq!((mapped[4].min_bpm, mapped[4].max_bpm), (166, 220));

    let issues = ZoneValidator::validate(&mapped);
    assert!(issues.iter().any(|i| i.contains("overlaps")));
}

#[test]
fn test_mapper_splits_fat_burn_and_peak() {
    let recorded = vec![
        HeartRateZone::new("Fat Burn", 0, 0, 100),
        HeartRateZone::new("Peak", 0, 0, 50),
    ];
    let mapped = ZoneMapper::map_legacy_zones(&recorded);
    assert_eq!(minutes(&mapped), vec![60, 40, 0, 0, 50]);
}

#[test]
fn test_validator_overlap_and_gap() {
    let zone = |index: u8, min_bpm: u16, max_bpm: u16| {
        let mut zone = HeartRateZone::new(format!("Zone {}", index), min_bpm, max_bpm, 0);
        zone.zone_index = Some(index);
        zone
    };

    let overlapping = ZoneValidator::validate(&[zone(1, 100, 120), zone(2, 115, 140)]);
    assert_eq!(overlapping, vec!["Zone 1 overlaps with Zone 2".to_string()]);

    let gapped = ZoneValidator::validate(&[zone(1, 100, 120), zone(2, 130, 140)]);
    assert_eq!(gapped, vec!["Gap between Zone 1 and Zone 2".to_string()]);
}

#[test]
fn test_validator_reports_empty_and_implausible_sets() {
    assert_eq!(ZoneValidator::validate(&[]), vec!["no zones provided".to_string()]);

    let mut low = HeartRateZone::new("Zone 1", 20, 30, 0);
    low.zone_index = Some(1);
    let issues = ZoneValidator::validate(&[low]);
    assert!(issues.contains(&"Zone 1 has unrealistic minimum heart rate: 20".to_string()));
    assert!(issues.contains(&"Zone 1 has unrealistic maximum heart rate: 30".to_string()));
}

#[test]
fn test_redistribution_drops_extra_recorded_zones() {
    let recorded: Vec<_> = (1..=7)
        .map(|i| HeartRateZone::new(format!("R{}", i), 0, 0, i * 10))
        .collect();
    let calculated = ZoneCalculator::new(UserProfile::default())
        .percentage_zones(180)
        .unwrap();

    let zones = redistribute_zone_time(&recorded, calculated);
    assert_eq!(minutes(&zones), vec![10, 20, 30, 40, 50]);
}

#[test]
fn test_batch_without_any_heart_rate_data() {
    let reconciler = ZoneReconciler::new(UserProfile::default());
    let mut activities = vec![activity_on(1, 1, None), activity_on(2, 2, None)];

    let report = reconciler.recalculate_all(&mut activities);

    assert_eq!(report.skipped, 2);
    assert!(report.failed.is_empty());
    assert!(activities.iter().all(|a| a.export_zones().is_empty()));
}

proptest! {
    #[test]
    fn prop_karvonen_zones_are_contiguous(max_hr in 120u16..=220, resting_hr in 35u16..=95) {
        prop_assume!(resting_hr < max_hr);

        let calculator = ZoneCalculator::new(UserProfile::default());
        let zones = calculator.karvonen_zones(max_hr, resting_hr).unwrap();

        prop_assert_eq!(zones.len(), 5);
        for pair in zones.windows(2) {
            prop_assert_eq!(pair[0].max_bpm, pair[1].min_bpm);
            prop_assert!(pair[0].min_bpm <= pair[1].min_bpm);
        }
        for zone in &zones {
            prop_assert!(zone.min_bpm < zone.max_bpm);
        }
        prop_assert_eq!(zones[4].max_bpm, max_hr);
        prop_assert!(zones[0].min_bpm >= resting_hr);
    }

    #[test]
    fn prop_percentage_zones_top_out_at_max(max_hr in 80u16..=250) {
        let zones = ZoneCalculator::new(UserProfile::default())
            .percentage_zones(max_hr)
            .unwrap();

        prop_assert_eq!(zones[4].max_bpm, max_hr);
        prop_assert_eq!(zones[0].min_bpm, max_hr / 2);
        for zone in &zones {
            prop_assert!(zone.min_bpm <= zone.max_bpm);
        }
    }

    #[test]
    fn prop_mapper_never_exceeds_source_minutes(
        fat_burn in 0u32..10_000,
        cardio in 0u32..10_000,
        peak in 0u32..10_000,
    ) {
        let recorded = vec![
            HeartRateZone::new("Fat Burn", 98, 137, fat_burn),
            HeartRateZone::new("Cardio", 137, 166, cardio),
            HeartRateZone::new("Peak", 166, 220, peak),
        ];
        let mapped = ZoneMapper::map_legacy_zones(&recorded);

        let total: u32 = mapped.iter().map(|z| z.minutes).sum();
        prop_assert!(total <= fat_burn + cardio + peak);
        prop_assert_eq!(mapped[4].minutes, peak);
    }
}
