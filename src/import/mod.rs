//! Google Takeout (Fitbit) import
//!
//! [`TakeoutLayout`] finds the Fitbit data root and its category folders,
//! the [`TakeoutFileKind`] implementations decide which JSON files hold
//! which records, and [`ImportManager`] parses them in parallel into
//! [`UserData`].

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::logging::DiagnosticReport;
use crate::models::{ActivityRecord, DailyMetric, UserData};

pub mod fitbit;
pub mod parallel;

pub use parallel::{ParallelConfig, ParallelProcessor, ProcessingSummary};

/// Import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// None of the known data root locations exists
    #[error("No Fitbit data directory found under {root}")]
    DataRootNotFound { root: PathBuf, tried: Vec<PathBuf> },

    /// A file could not be read or is not JSON
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Known top-level folders of a Fitbit export
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DataCategory {
    GlobalExport,
    Activities,
    Sleep,
    SleepScore,
    HeartRateVariability,
    Biometrics,
    ActiveZoneMinutes,
    DailyReadiness,
    StressJournal,
    OxygenSaturation,
    Temperature,
    PhysicalActivity,
    SnoreAndNoise,
    Mindfulness,
    MenstrualHealth,
}

impl DataCategory {
    pub const ALL: [DataCategory; 15] = [
        DataCategory::GlobalExport,
        DataCategory::Activities,
        DataCategory::Sleep,
        DataCategory::SleepScore,
        DataCategory::HeartRateVariability,
        DataCategory::Biometrics,
        DataCategory::ActiveZoneMinutes,
        DataCategory::DailyReadiness,
        DataCategory::StressJournal,
        DataCategory::OxygenSaturation,
        DataCategory::Temperature,
        DataCategory::PhysicalActivity,
        DataCategory::SnoreAndNoise,
        DataCategory::Mindfulness,
        DataCategory::MenstrualHealth,
    ];

    /// Folder name used in the export
    pub fn dir_name(&self) -> &'static str {
        match self {
            DataCategory::GlobalExport => "Global Export Data",
            DataCategory::Activities => "Activities",
            DataCategory::Sleep => "Sleep",
            DataCategory::SleepScore => "Sleep Score",
            DataCategory::HeartRateVariability => "Heart Rate Variability",
            DataCategory::Biometrics => "Biometrics",
            DataCategory::ActiveZoneMinutes => "Active Zone Minutes (AZM)",
            DataCategory::DailyReadiness => "Daily Readiness",
            DataCategory::StressJournal => "Stress Journal",
            DataCategory::OxygenSaturation => "Oxygen Saturation (SpO2)",
            DataCategory::Temperature => "Temperature",
            DataCategory::PhysicalActivity => "Physical Activity_GoogleData",
            DataCategory::SnoreAndNoise => "Snore and Noise Detect",
            DataCategory::Mindfulness => "Mindfulness",
            DataCategory::MenstrualHealth => "Menstrual Health",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.dir_name() == name)
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Located Fitbit export
#[derive(Debug, Clone)]
pub struct TakeoutLayout {
    /// Path given by the user
    pub root: PathBuf,
    /// Folder holding the category directories
    pub data_root: PathBuf,
    pub directories: BTreeMap<DataCategory, PathBuf>,
}

impl TakeoutLayout {
    /// Data root candidates, in lookup order
    pub fn candidate_roots(root: &Path) -> Vec<PathBuf> {
        vec![
            root.join("Takeout").join("Fitbit"),
            root.join("Takeout 2").join("Fitbit"),
            root.join("Fitbit"),
            root.to_path_buf(),
        ]
    }

    pub fn discover(root: &Path) -> Result<Self, ImportError> {
        let tried = Self::candidate_roots(root);
        let Some(data_root) = tried.iter().find(|p| p.is_dir()).cloned() else {
            return Err(ImportError::DataRootNotFound {
                root: root.to_path_buf(),
                tried,
            });
        };

        let mut directories = BTreeMap::new();
        for entry in fs::read_dir(&data_root)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if let Some(category) = DataCategory::from_dir_name(name) {
                debug!("Found data directory: {} -> {}", name, path.display());
                directories.insert(category, path);
            }
        }

        info!(
            "Discovered {} data directories under {}",
            directories.len(),
            data_root.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            data_root,
            directories,
        })
    }

    pub fn directory(&self, category: DataCategory) -> Option<&Path> {
        self.directories.get(&category).map(PathBuf::as_path)
    }

    pub fn categories(&self) -> Vec<DataCategory> {
        self.directories.keys().copied().collect()
    }

    /// JSON files of `kind` under its categories, sorted and deduplicated
    pub fn files_for<K: TakeoutFileKind>(&self, kind: &K) -> Vec<PathBuf> {
        let files: BTreeSet<PathBuf> = kind
            .source_categories()
            .iter()
            .filter_map(|category| self.directory(*category))
            .flat_map(collect_json_files)
            .filter(|path| kind.can_import(path))
            .collect();
        files.into_iter().collect()
    }
}

/// Recursively list `*.json` files; unreadable folders are logged and skipped
fn collect_json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %current.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
            {
                files.push(path);
            }
        }
    }

    files
}

fn lowercase_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// A family of Takeout JSON files and the records they hold
pub trait TakeoutFileKind: Sync {
    type Record: Send;

    /// Folders searched for this kind of file
    fn source_categories(&self) -> &'static [DataCategory];

    fn can_import(&self, file_path: &Path) -> bool;

    fn import_file(&self, file_path: &Path) -> Result<Vec<Self::Record>, ImportError>;

    fn format_name(&self) -> &'static str;
}

/// Exercise logs
pub struct ActivityFiles;

impl TakeoutFileKind for ActivityFiles {
    type Record = ActivityRecord;

    fn source_categories(&self) -> &'static [DataCategory] {
        &[
            DataCategory::Activities,
            DataCategory::GlobalExport,
            DataCategory::PhysicalActivity,
        ]
    }

    fn can_import(&self, file_path: &Path) -> bool {
        let name = lowercase_file_name(file_path);
        ["exercise", "activity", "workout"]
            .iter()
            .any(|keyword| name.contains(keyword))
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<ActivityRecord>, ImportError> {
        fitbit::parse_activity_file(file_path)
    }

    fn format_name(&self) -> &'static str {
        "Activity"
    }
}

/// Per-day aggregates from the global export
pub struct DailyMetricFiles;

impl TakeoutFileKind for DailyMetricFiles {
    type Record = DailyMetric;

    fn source_categories(&self) -> &'static [DataCategory] {
        &[DataCategory::GlobalExport]
    }

    fn can_import(&self, file_path: &Path) -> bool {
        let name = lowercase_file_name(file_path);
        if name.starts_with("resting_heart_rate") {
            return true;
        }
        !["exercise", "activity", "sleep", "heart_rate"]
            .iter()
            .any(|skip| name.contains(skip))
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<DailyMetric>, ImportError> {
        fitbit::parse_daily_metric_file(file_path)
    }

    fn format_name(&self) -> &'static str {
        "Daily Metric"
    }
}

/// What an import run found
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub data_root: PathBuf,
    pub categories: Vec<DataCategory>,
    pub activities: ProcessingSummary,
    pub daily_metrics: ProcessingSummary,
    /// Activities dropped because their log id was already seen
    pub duplicate_activities: usize,
}

impl ImportReport {
    pub fn failed_files(&self) -> usize {
        self.activities.failed_files + self.daily_metrics.failed_files
    }

    pub fn add_to_diagnostics(&self, diagnostics: &mut DiagnosticReport) {
        diagnostics.add_context("data_root", self.data_root.display().to_string());
        diagnostics.add_context("activity_files", self.activities.total_files.to_string());
        diagnostics.add_context("daily_files", self.daily_metrics.total_files.to_string());
        diagnostics.add_context("duplicate_activities", self.duplicate_activities.to_string());

        for (path, error) in self
            .activities
            .errors
            .iter()
            .chain(self.daily_metrics.errors.iter())
        {
            diagnostics.add_error_message(format!("{}: {}", path.display(), error), "ImportError");
        }
        for path in self
            .activities
            .slow_files
            .iter()
            .chain(self.daily_metrics.slow_files.iter())
        {
            diagnostics.add_warning(format!("Slow file: {}", path.display()));
        }
    }
}

/// Parses a whole export into [`UserData`]
pub struct ImportManager {
    processor: ParallelProcessor,
}

impl ImportManager {
    pub fn new(config: ParallelConfig) -> Self {
        Self {
            processor: ParallelProcessor::new(config),
        }
    }

    /// Discover the layout under `root` and import it
    pub fn import_takeout(&self, root: &Path) -> Result<(UserData, ImportReport), ImportError> {
        let layout = TakeoutLayout::discover(root)?;
        Ok(self.import(&layout))
    }

    pub fn import(&self, layout: &TakeoutLayout) -> (UserData, ImportReport) {
        let (activities, activity_summary) = self.import_kind(layout, &ActivityFiles);
        let (mut daily_metrics, daily_summary) = self.import_kind(layout, &DailyMetricFiles);

        let (activities, duplicate_activities) = deduplicate_activities(activities);
        daily_metrics.sort_by_key(|m| m.date);

        info!(
            activities = activities.len(),
            daily_metrics = daily_metrics.len(),
            duplicates = duplicate_activities,
            "Import finished"
        );

        let data = UserData {
            activities,
            daily_metrics,
        };
        let report = ImportReport {
            data_root: layout.data_root.clone(),
            categories: layout.categories(),
            activities: activity_summary,
            daily_metrics: daily_summary,
            duplicate_activities,
        };

        (data, report)
    }

    fn import_kind<K: TakeoutFileKind>(
        &self,
        layout: &TakeoutLayout,
        kind: &K,
    ) -> (Vec<K::Record>, ProcessingSummary) {
        let files = layout.files_for(kind);
        if files.is_empty() {
            warn!("No {} files found under {}", kind.format_name(), layout.data_root.display());
        }
        self.processor
            .process(kind.format_name(), &files, |path| kind.import_file(path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new(ParallelConfig::default())
    }
}

/// Sort by start time and drop repeated log ids (0 means unknown and is kept)
fn deduplicate_activities(mut activities: Vec<ActivityRecord>) -> (Vec<ActivityRecord>, usize) {
    activities.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.log_id.cmp(&b.log_id)));

    let before = activities.len();
    let mut seen = HashSet::new();
    activities.retain(|a| a.log_id == 0 || seen.insert(a.log_id));

    let duplicates = before - activities.len();
    (activities, duplicates)
}
