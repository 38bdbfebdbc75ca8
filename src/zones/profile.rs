use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{ActivityRecord, DailyMetric, FitnessLevel, UserProfile};

/// Share of active days above which a user counts as advanced
const ADVANCED_FREQUENCY: Decimal = dec!(0.5);
/// Share of active days above which a user counts as intermediate
const INTERMEDIATE_FREQUENCY: Decimal = dec!(0.2);

/// Infers a physiological profile from the whole data set
pub struct ProfileEstimator;

impl ProfileEstimator {
    /// Estimate a profile from all activities and daily metrics.
    ///
    /// - resting HR: truncated mean of the non-zero daily resting values
    /// - max HR: highest non-zero max HR recorded in an activity
    /// - fitness level: share of calendar days, first to last activity
    ///   inclusive, with at least one activity
    ///
    /// Age is never inferred.
    pub fn estimate(activities: &[ActivityRecord], daily_metrics: &[DailyMetric]) -> UserProfile {
        let profile = UserProfile {
            age: None,
            resting_heart_rate: Self::mean_resting_heart_rate(daily_metrics),
            max_heart_rate: Self::peak_max_heart_rate(activities),
            fitness_level: Self::fitness_level(activities),
        };

        tracing::debug!(
            resting_hr = ?profile.resting_heart_rate,
            max_hr = ?profile.max_heart_rate,
            fitness_level = ?profile.fitness_level,
            "Estimated user profile"
        );

        profile
    }

    fn mean_resting_heart_rate(daily_metrics: &[DailyMetric]) -> Option<u16> {
        let (sum, count) = daily_metrics
            .iter()
            .filter_map(|metric| metric.resting_heart_rate)
            .filter(|hr| *hr > 0)
            .fold((0u64, 0u64), |(sum, count), hr| (sum + u64::from(hr), count + 1));

        if count == 0 {
            return None;
        }
        u16::try_from(sum / count).ok()
    }

    fn peak_max_heart_rate(activities: &[ActivityRecord]) -> Option<u16> {
        activities
            .iter()
            .filter_map(|activity| activity.max_heart_rate)
            .filter(|hr| *hr > 0)
            .max()
    }

    fn fitness_level(activities: &[ActivityRecord]) -> Option<FitnessLevel> {
        let active_days: BTreeSet<_> = activities.iter().map(|a| a.date()).collect();
        let first = *active_days.first()?;
        let last = *active_days.last()?;

        let total_days = (last - first).num_days() + 1;
        let frequency = Decimal::from(active_days.len()) / Decimal::from(total_days);

        let level = if frequency > ADVANCED_FREQUENCY {
            FitnessLevel::Advanced
        } else if frequency > INTERMEDIATE_FREQUENCY {
            FitnessLevel::Intermediate
        } else {
            FitnessLevel::Beginner
        };
        Some(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn activity_on(day_offset: i64, max_hr: Option<u16>) -> ActivityRecord {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
            + Duration::days(day_offset);
        let mut activity = ActivityRecord::new(day_offset, "Run", start);
        activity.max_heart_rate = max_hr;
        activity
    }

    fn metric(resting_hr: Option<u16>) -> DailyMetric {
        let mut metric = DailyMetric::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        metric.resting_heart_rate = resting_hr;
        metric
    }

    /// Activities on `active` distinct days spread over exactly `span` days
    fn spread(active: i64, span: i64) -> Vec<ActivityRecord> {
        let mut activities: Vec<_> = (0..active - 1).map(|d| activity_on(d, None)).collect();
        activities.push(activity_on(span - 1, None));
        activities
    }

    #[test]
    fn test_empty_inputs_give_empty_profile() {
        let profile = ProfileEstimator::estimate(&[], &[]);
        assert!(profile.is_empty());
    }

    #[test]
    fn test_resting_heart_rate_mean_truncates() {
        let metrics = vec![metric(Some(60)), metric(None), metric(Some(63)), metric(Some(0))];
        let profile = ProfileEstimator::estimate(&[], &metrics);
        // (60 + 63) / 2 = 61.5
        assert_eq!(profile.resting_heart_rate, Some(61));
    }

    #[test]
    fn test_max_heart_rate_is_peak_of_activities() {
        let activities = vec![
            activity_on(0, Some(171)),
            activity_on(1, None),
            activity_on(2, Some(188)),
        ];
        let profile = ProfileEstimator::estimate(&activities, &[]);
        assert_eq!(profile.max_heart_rate, Some(188));
        assert_eq!(profile.resting_heart_rate, None);
    }

    #[test]
    fn test_fitness_level_boundaries() {
        let level =
            |active, span| ProfileEstimator::estimate(&spread(active, span), &[]).fitness_level;

        assert_eq!(level(10, 20), Some(FitnessLevel::Intermediate));
        assert_eq!(level(11, 20), Some(FitnessLevel::Advanced));
        assert_eq!(level(4, 20), Some(FitnessLevel::Beginner));
        assert_eq!(level(5, 20), Some(FitnessLevel::Intermediate));
    }

    #[test]
    fn test_single_day_is_advanced() {
        let activities = vec![activity_on(3, None), activity_on(3, None)];
        let profile = ProfileEstimator::estimate(&activities, &[]);
        assert_eq!(profile.fitness_level, Some(FitnessLevel::Advanced));
    }

    #[test]
    fn test_estimation_is_idempotent() {
        let activities = vec![activity_on(0, Some(180)), activity_on(6, Some(176))];
        let metrics = vec![metric(Some(58)), metric(Some(61))];

        let first = ProfileEstimator::estimate(&activities, &metrics);
        let second = ProfileEstimator::estimate(&activities, &metrics);
        assert_eq!(first, second);
    }
}
