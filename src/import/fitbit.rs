//! Fitbit Takeout JSON records
//!
//! Field names follow the export (`logId`, `activeDuration`, ...). Numeric
//! fields are read as `Decimal` because the export mixes integers and floats
//! for the same field across years.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::ImportError;
use crate::models::{ActivityRecord, DailyMetric, HeartRateZone};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActivity {
    log_id: Option<i64>,
    activity_name: Option<String>,
    start_time: Option<String>,
    original_start_time: Option<String>,
    active_duration: Option<Decimal>,
    duration: Option<Decimal>,
    calories: Option<Decimal>,
    distance: Option<Decimal>,
    steps: Option<Decimal>,
    average_heart_rate: Option<Decimal>,
    max_heart_rate: Option<Decimal>,
    min_heart_rate: Option<Decimal>,
    #[serde(default)]
    heart_rate_zones: Vec<RawZone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawZone {
    name: Option<String>,
    min: Option<Decimal>,
    max: Option<Decimal>,
    minutes: Option<Decimal>,
    calories_out: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDailyMetric {
    date_time: Option<String>,
    date: Option<String>,
    steps: Option<Decimal>,
    distance: Option<Decimal>,
    calories_out: Option<Decimal>,
    resting_heart_rate: Option<Decimal>,
    value: Option<Value>,
}

/// Parse an activity file holding one record or an array of records.
///
/// Records that cannot be read are logged and skipped; only an unreadable or
/// non-JSON file is an error.
pub fn parse_activity_file(path: &Path) -> Result<Vec<ActivityRecord>, ImportError> {
    let activities: Vec<ActivityRecord> = read_records(path)?
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<RawActivity>(record) {
            Ok(raw) => raw.into_activity(),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping malformed activity record");
                None
            }
        })
        .collect();

    debug!(file = %path.display(), count = activities.len(), "Parsed activity file");
    Ok(activities)
}

/// Parse a daily metric file holding one record or an array of records
pub fn parse_daily_metric_file(path: &Path) -> Result<Vec<DailyMetric>, ImportError> {
    let metrics: Vec<DailyMetric> = read_records(path)?
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<RawDailyMetric>(record) {
            Ok(raw) => raw.into_metric(),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping malformed daily record");
                None
            }
        })
        .collect();

    debug!(file = %path.display(), count = metrics.len(), "Parsed daily metric file");
    Ok(metrics)
}

fn read_records(path: &Path) -> Result<Vec<Value>, ImportError> {
    let content = fs::read_to_string(path).map_err(|e| ImportError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let value: Value = serde_json::from_str(&content).map_err(|e| ImportError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Ok(vec![value]),
        _ => Err(ImportError::Parse {
            path: path.to_path_buf(),
            reason: "expected a JSON object or array".to_string(),
        }),
    }
}

impl RawActivity {
    fn into_activity(self) -> Option<ActivityRecord> {
        let log_id = self.log_id.unwrap_or(0);

        let Some(raw_start) = self.start_time.or(self.original_start_time) else {
            warn!(log_id, "No start time found for activity");
            return None;
        };
        let Some(start_time) = parse_timestamp(&raw_start) else {
            warn!(log_id, start_time = %raw_start, "Unrecognised activity start time");
            return None;
        };

        let name = self.activity_name.unwrap_or_else(|| "Unknown".to_string());
        let mut activity = ActivityRecord::new(log_id, name, start_time);

        activity.duration_ms = self
            .active_duration
            .or(self.duration)
            .and_then(|ms| ms.trunc().to_u64())
            .unwrap_or(0);
        activity.calories = self.calories.and_then(|v| v.trunc().to_u32());
        activity.distance = self.distance;
        activity.steps = self.steps.and_then(|v| v.trunc().to_u32());
        activity.average_heart_rate = self.average_heart_rate.and_then(to_bpm);
        activity.max_heart_rate = self.max_heart_rate.and_then(to_bpm);
        activity.min_heart_rate = self.min_heart_rate.and_then(to_bpm);
        activity.heart_rate_zones = self
            .heart_rate_zones
            .into_iter()
            .map(RawZone::into_zone)
            .collect();

        Some(activity)
    }
}

impl RawZone {
    fn into_zone(self) -> HeartRateZone {
        let mut zone = HeartRateZone::new(
            self.name.unwrap_or_else(|| "Unknown".to_string()),
            self.min.and_then(|v| v.trunc().to_u16()).unwrap_or(0),
            self.max.and_then(|v| v.trunc().to_u16()).unwrap_or(0),
            self.minutes.and_then(|v| v.trunc().to_u32()).unwrap_or(0),
        );
        zone.calories_out = self.calories_out;
        zone
    }
}

impl RawDailyMetric {
    fn into_metric(self) -> Option<DailyMetric> {
        let raw_date = self.date_time.or(self.date)?;
        let date = parse_date(&raw_date)?;

        let mut metric = DailyMetric::new(date);
        metric.steps = self.steps.and_then(|v| v.trunc().to_u32());
        metric.distance = self.distance;
        metric.calories_burned = self.calories_out.and_then(|v| v.trunc().to_u32());
        metric.resting_heart_rate = self
            .resting_heart_rate
            .or_else(|| self.value.as_ref().and_then(nested_resting_heart_rate))
            .and_then(to_bpm);

        Some(metric)
    }
}

/// `{"value": {"value": 61.4, "error": 6.8}}` as found in resting_heart_rate files
fn nested_resting_heart_rate(value: &Value) -> Option<Decimal> {
    let inner = value.get("value")?;
    serde_json::from_value(inner.clone()).ok()
}

/// Whole bpm; zero counts as absent
fn to_bpm(value: Decimal) -> Option<u16> {
    value.trunc().to_u16().filter(|bpm| *bpm > 0)
}

const DATETIME_FORMATS: [&str; 4] = [
    "%m/%d/%y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

/// Parse a local timestamp in any of the layouts the export uses.
///
/// Offsets are dropped; the local wall-clock time is kept.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse the calendar date of a daily record
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|dt| dt.date())
}
