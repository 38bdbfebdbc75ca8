use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One heart rate training-intensity band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateZone {
    /// Display label ("Fat Burn", "Aerobic Base", "Zone 3", ...)
    pub name: String,

    /// Lower boundary in bpm (inclusive)
    #[serde(rename = "min", default)]
    pub min_bpm: u16,

    /// Upper boundary in bpm (inclusive)
    #[serde(rename = "max", default)]
    pub max_bpm: u16,

    /// Time spent in this band during one activity
    #[serde(default)]
    pub minutes: u32,

    /// Energy attributed to the zone
    #[serde(rename = "caloriesOut", default)]
    pub calories_out: Option<Decimal>,

    /// 1-based position within a zone set
    #[serde(default)]
    pub zone_index: Option<u8>,

    /// Midpoint of the band as a percentage of max HR (informational)
    #[serde(default)]
    pub percentage_max_hr: Option<Decimal>,

    /// Midpoint of the band as a percentage of HR reserve (informational)
    #[serde(default)]
    pub percentage_hr_reserve: Option<Decimal>,

    /// Label following the target platform's naming convention
    #[serde(default)]
    pub garmin_zone_name: Option<String>,
}

impl HeartRateZone {
    /// Create a zone with boundaries and minutes, leaving metadata empty
    pub fn new(name: impl Into<String>, min_bpm: u16, max_bpm: u16, minutes: u32) -> Self {
        Self {
            name: name.into(),
            min_bpm,
            max_bpm,
            minutes,
            calories_out: None,
            zone_index: None,
            percentage_max_hr: None,
            percentage_hr_reserve: None,
            garmin_zone_name: None,
        }
    }

    /// Name to show on the target platform
    pub fn display_name(&self) -> &str {
        self.garmin_zone_name.as_deref().unwrap_or(&self.name)
    }
}

/// Fitness level inferred from training frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    /// Typical resting heart rate for this fitness level
    pub fn estimated_resting_heart_rate(&self) -> u16 {
        match self {
            FitnessLevel::Beginner => 70,
            FitnessLevel::Intermediate => 65,
            FitnessLevel::Advanced => 55,
        }
    }
}

impl std::fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitnessLevel::Beginner => write!(f, "beginner"),
            FitnessLevel::Intermediate => write!(f, "intermediate"),
            FitnessLevel::Advanced => write!(f, "advanced"),
        }
    }
}

/// Physiological parameters for one conversion run
///
/// Built once from the whole data set and shared read-only by every
/// per-activity recalculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Age in years
    pub age: Option<u16>,

    /// Resting heart rate in bpm
    pub resting_heart_rate: Option<u16>,

    /// Measured maximum heart rate in bpm
    pub max_heart_rate: Option<u16>,

    /// Training frequency classification
    pub fitness_level: Option<FitnessLevel>,
}

impl UserProfile {
    /// Apply user-supplied values on top of an estimated profile
    pub fn with_overrides(
        mut self,
        age: Option<u16>,
        max_heart_rate: Option<u16>,
        resting_heart_rate: Option<u16>,
    ) -> Self {
        if age.is_some() {
            self.age = age;
        }
        if max_heart_rate.is_some() {
            self.max_heart_rate = max_heart_rate;
        }
        if resting_heart_rate.is_some() {
            self.resting_heart_rate = resting_heart_rate;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.resting_heart_rate.is_none()
            && self.max_heart_rate.is_none()
            && self.fitness_level.is_none()
    }
}

/// Where the zones handed to exporters come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneSource {
    Recalculated,
    Original,
}

impl std::fmt::Display for ZoneSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneSource::Recalculated => write!(f, "Recalculated"),
            ZoneSource::Original => write!(f, "Original"),
        }
    }
}

/// One exercise session from the fitness-tracker export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Source system identifier
    pub log_id: i64,

    /// Activity name as recorded
    pub activity_name: String,

    /// Local start time
    pub start_time: NaiveDateTime,

    /// Duration in milliseconds
    pub duration_ms: u64,

    pub calories: Option<u32>,

    /// Distance in kilometers
    pub distance: Option<Decimal>,

    pub steps: Option<u32>,

    /// Zones as recorded by the source system
    pub heart_rate_zones: Vec<HeartRateZone>,

    pub average_heart_rate: Option<u16>,
    pub max_heart_rate: Option<u16>,
    pub min_heart_rate: Option<u16>,

    /// Engine output: canonical 5-zone set, empty when nothing could be computed
    pub recalculated_hr_zones: Vec<HeartRateZone>,

    /// Effective resting heart rate used for recalculation
    pub resting_heart_rate: Option<u16>,

    /// Effective max heart rate used for recalculation
    pub max_heart_rate_calculated: Option<u16>,

    /// Max minus resting; negative only for implausible inputs
    pub heart_rate_reserve: Option<i32>,
}

impl ActivityRecord {
    pub fn new(log_id: i64, activity_name: impl Into<String>, start_time: NaiveDateTime) -> Self {
        Self {
            log_id,
            activity_name: activity_name.into(),
            start_time,
            duration_ms: 0,
            calories: None,
            distance: None,
            steps: None,
            heart_rate_zones: Vec::new(),
            average_heart_rate: None,
            max_heart_rate: None,
            min_heart_rate: None,
            recalculated_hr_zones: Vec::new(),
            resting_heart_rate: None,
            max_heart_rate_calculated: None,
            heart_rate_reserve: None,
        }
    }

    /// Zones exporters must use: recalculated when present, original otherwise
    pub fn export_zones(&self) -> &[HeartRateZone] {
        if self.recalculated_hr_zones.is_empty() {
            &self.heart_rate_zones
        } else {
            &self.recalculated_hr_zones
        }
    }

    pub fn zone_source(&self) -> ZoneSource {
        if self.recalculated_hr_zones.is_empty() {
            ZoneSource::Original
        } else {
            ZoneSource::Recalculated
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }

    pub fn duration_minutes(&self) -> Decimal {
        Decimal::from(self.duration_ms) / Decimal::from(60_000)
    }
}

/// Daily aggregated metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub steps: Option<u32>,
    pub distance: Option<Decimal>,
    pub calories_burned: Option<u32>,
    pub resting_heart_rate: Option<u16>,
}

impl DailyMetric {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            steps: None,
            distance: None,
            calories_burned: None,
            resting_heart_rate: None,
        }
    }
}

/// Everything parsed from one export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub activities: Vec<ActivityRecord>,
    pub daily_metrics: Vec<DailyMetric>,
}

impl UserData {
    /// Earliest and latest date across all records
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self
            .activities
            .iter()
            .map(|a| a.date())
            .chain(self.daily_metrics.iter().map(|d| d.date));

        dates.fold(None, |range, date| match range {
            None => Some((date, date)),
            Some((start, end)) => Some((start.min(date), end.max(date))),
        })
    }

    pub fn total_activities(&self) -> usize {
        self.activities.len()
    }

    pub fn total_daily_records(&self) -> usize {
        self.daily_metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty() && self.daily_metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_export_zones_prefers_recalculated() {
        let mut activity = ActivityRecord::new(1, "Run", start(1));
        activity.heart_rate_zones = vec![HeartRateZone::new("Fat Burn", 98, 137, 20)];
        assert_eq!(activity.zone_source(), ZoneSource::Original);
        assert_eq!(activity.export_zones()[0].name, "Fat Burn");

        activity.recalculated_hr_zones = vec![HeartRateZone::new("Aerobic Base", 114, 133, 20)];
        assert_eq!(activity.zone_source(), ZoneSource::Recalculated);
        assert_eq!(activity.export_zones()[0].name, "Aerobic Base");
    }

    #[test]
    fn test_export_zones_empty_falls_back_to_empty_original() {
        let activity = ActivityRecord::new(2, "Walk", start(2));
        assert!(activity.export_zones().is_empty());
        assert_eq!(activity.zone_source(), ZoneSource::Original);
    }

    #[test]
    fn test_zone_json_field_names() {
        let json = r#"{"name":"Cardio","min":137,"max":166,"minutes":12,"caloriesOut":98.5}"#;
        let zone: HeartRateZone = serde_json::from_str(json).unwrap();
        assert_eq!(zone.min_bpm, 137);
        assert_eq!(zone.max_bpm, 166);
        assert_eq!(zone.minutes, 12);
        assert!(zone.calories_out.is_some());
        assert_eq!(zone.display_name(), "Cardio");
    }

    #[test]
    fn test_profile_overrides() {
        let estimated = UserProfile {
            age: None,
            resting_heart_rate: Some(62),
            max_heart_rate: Some(181),
            fitness_level: Some(FitnessLevel::Intermediate),
        };
        let profile = estimated.with_overrides(Some(40), None, Some(58));
        assert_eq!(profile.age, Some(40));
        assert_eq!(profile.max_heart_rate, Some(181));
        assert_eq!(profile.resting_heart_rate, Some(58));
        assert!(!profile.is_empty());
        assert!(UserProfile::default().is_empty());
    }

    #[test]
    fn test_date_range() {
        let mut data = UserData::default();
        assert_eq!(data.date_range(), None);

        data.activities.push(ActivityRecord::new(1, "Run", start(5)));
        data.daily_metrics
            .push(DailyMetric::new(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()));
        data.activities.push(ActivityRecord::new(2, "Run", start(9)));

        let (first, last) = data.date_range().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }
}
