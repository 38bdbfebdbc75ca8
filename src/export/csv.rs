//! CSV exports: per-zone rows, activity summary and daily metrics
//!
//! Every file is written with an explicit header row so that an empty data
//! set still yields a well-formed CSV.

use ::csv::WriterBuilder;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::ExportError;
use crate::models::{ActivityRecord, DailyMetric, ZoneSource};

pub const HEART_RATE_ZONES_FILE: &str = "heart_rate_zones.csv";
pub const ACTIVITIES_SUMMARY_FILE: &str = "activities_summary.csv";
pub const DAILY_METRICS_FILE: &str = "daily_metrics.csv";

pub const HEART_RATE_ZONE_HEADERS: [&str; 20] = [
    "Date",
    "Activity",
    "Start Time",
    "Duration (minutes)",
    "Average HR",
    "Max HR",
    "Min HR",
    "Calculated Max HR",
    "Resting HR",
    "HR Reserve",
    "Zone Source",
    "Zone Number",
    "Zone Name",
    "Garmin Zone Name",
    "Min BPM",
    "Max BPM",
    "Time in Zone (minutes)",
    "Calories in Zone",
    "Percentage Max HR",
    "Percentage HR Reserve",
];

const ACTIVITY_HEADERS: [&str; 13] = [
    "Date",
    "Start Time",
    "Log ID",
    "Activity Name",
    "Duration (minutes)",
    "Distance (km)",
    "Calories",
    "Steps",
    "Average HR",
    "Max HR",
    "Min HR",
    "Zone Source",
    "Zone Count",
];

const DAILY_HEADERS: [&str; 5] = [
    "Date",
    "Steps",
    "Distance (km)",
    "Calories Burned",
    "Resting HR",
];

/// Field order matches [`HEART_RATE_ZONE_HEADERS`]
#[derive(Debug, Serialize)]
struct ZoneRow<'a> {
    date: NaiveDate,
    activity: &'a str,
    start_time: String,
    duration_minutes: Decimal,
    average_hr: Option<u16>,
    max_hr: Option<u16>,
    min_hr: Option<u16>,
    calculated_max_hr: Option<u16>,
    resting_hr: Option<u16>,
    hr_reserve: Option<i32>,
    zone_source: ZoneSource,
    zone_number: usize,
    zone_name: &'a str,
    garmin_zone_name: &'a str,
    min_bpm: u16,
    max_bpm: u16,
    minutes: u32,
    calories: Option<Decimal>,
    percentage_max_hr: Option<Decimal>,
    percentage_hr_reserve: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct ActivityRow<'a> {
    date: NaiveDate,
    start_time: String,
    log_id: i64,
    activity_name: &'a str,
    duration_minutes: Decimal,
    distance_km: Option<Decimal>,
    calories: Option<u32>,
    steps: Option<u32>,
    average_hr: Option<u16>,
    max_hr: Option<u16>,
    min_hr: Option<u16>,
    zone_source: ZoneSource,
    zone_count: usize,
}

#[derive(Debug, Serialize)]
struct DailyRow {
    date: NaiveDate,
    steps: Option<u32>,
    distance_km: Option<Decimal>,
    calories_burned: Option<u32>,
    resting_hr: Option<u16>,
}

fn write_rows<R: Serialize>(path: &Path, headers: &[&str], rows: &[R]) -> Result<(), ExportError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn by_start_time(activities: &[ActivityRecord]) -> Vec<&ActivityRecord> {
    let mut sorted: Vec<&ActivityRecord> = activities.iter().collect();
    sorted.sort_by_key(|a| a.start_time);
    sorted
}

fn duration_minutes(activity: &ActivityRecord) -> Decimal {
    activity.duration_minutes().round_dp(2).normalize()
}

/// One row per exported zone of each activity, ordered by start time.
///
/// Returns the file path and the number of zone rows.
pub fn export_heart_rate_zones(
    activities: &[ActivityRecord],
    output_dir: &Path,
) -> Result<(PathBuf, usize), ExportError> {
    let rows: Vec<ZoneRow> = by_start_time(activities)
        .into_iter()
        .flat_map(|activity| {
            let source = activity.zone_source();
            activity
                .export_zones()
                .iter()
                .enumerate()
                .map(move |(i, zone)| ZoneRow {
                    date: activity.date(),
                    activity: &activity.activity_name,
                    start_time: activity.start_time.format("%H:%M:%S").to_string(),
                    duration_minutes: duration_minutes(activity),
                    average_hr: activity.average_heart_rate,
                    max_hr: activity.max_heart_rate,
                    min_hr: activity.min_heart_rate,
                    calculated_max_hr: activity.max_heart_rate_calculated,
                    resting_hr: activity.resting_heart_rate,
                    hr_reserve: activity.heart_rate_reserve,
                    zone_source: source,
                    zone_number: zone.zone_index.map(usize::from).unwrap_or(i + 1),
                    zone_name: &zone.name,
                    garmin_zone_name: zone.display_name(),
                    min_bpm: zone.min_bpm,
                    max_bpm: zone.max_bpm,
                    minutes: zone.minutes,
                    calories: zone.calories_out,
                    percentage_max_hr: zone.percentage_max_hr,
                    percentage_hr_reserve: zone.percentage_hr_reserve,
                })
        })
        .collect();

    let path = output_dir.join(HEART_RATE_ZONES_FILE);
    write_rows(&path, &HEART_RATE_ZONE_HEADERS, &rows)?;
    tracing::info!("Exported {} heart rate zone rows to {}", rows.len(), path.display());

    Ok((path, rows.len()))
}

pub fn export_activities_summary(
    activities: &[ActivityRecord],
    output_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let rows: Vec<ActivityRow> = by_start_time(activities)
        .into_iter()
        .map(|activity| ActivityRow {
            date: activity.date(),
            start_time: activity.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            log_id: activity.log_id,
            activity_name: &activity.activity_name,
            duration_minutes: duration_minutes(activity),
            distance_km: activity.distance,
            calories: activity.calories,
            steps: activity.steps,
            average_hr: activity.average_heart_rate,
            max_hr: activity.max_heart_rate,
            min_hr: activity.min_heart_rate,
            zone_source: activity.zone_source(),
            zone_count: activity.export_zones().len(),
        })
        .collect();

    let path = output_dir.join(ACTIVITIES_SUMMARY_FILE);
    write_rows(&path, &ACTIVITY_HEADERS, &rows)?;
    Ok(path)
}

pub fn export_daily_metrics(
    metrics: &[DailyMetric],
    output_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let mut rows: Vec<DailyRow> = metrics
        .iter()
        .map(|metric| DailyRow {
            date: metric.date,
            steps: metric.steps,
            distance_km: metric.distance,
            calories_burned: metric.calories_burned,
            resting_hr: metric.resting_heart_rate,
        })
        .collect();
    rows.sort_by_key(|row| row.date);

    let path = output_dir.join(DAILY_METRICS_FILE);
    write_rows(&path, &DAILY_HEADERS, &rows)?;
    Ok(path)
}
