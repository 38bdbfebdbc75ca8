use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::logging::DiagnosticReport;
use crate::models::UserData;

pub mod csv;
pub mod tcx;

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Tcx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Csv, ExportFormat::Tcx];

    /// Expand a user selection; "all" selects every format
    pub fn parse_selection(s: &str) -> Result<Vec<Self>, ExportError> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::ALL.to_vec());
        }
        s.parse().map(|format| vec![format])
    }

    /// Expand several selections, dropping repeats and keeping first-seen order
    pub fn parse_selections<S: AsRef<str>>(selections: &[S]) -> Result<Vec<Self>, ExportError> {
        let mut formats = Vec::new();
        for selection in selections {
            for format in Self::parse_selection(selection.as_ref())? {
                if !formats.contains(&format) {
                    formats.push(format);
                }
            }
        }
        Ok(formats)
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tcx" => Ok(ExportFormat::Tcx),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Tcx => write!(f, "tcx"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Files written by one export run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub zone_rows: usize,
    pub tcx_files: usize,
    /// Activities with no zones in either set, so no TCX was written
    pub activities_without_zones: usize,
    /// Activities whose TCX file could not be written, with the reason
    pub failed_activities: Vec<(i64, String)>,
}

impl ExportSummary {
    pub fn add_to_diagnostics(&self, diagnostics: &mut DiagnosticReport) {
        diagnostics.add_context("files_written", self.files.len().to_string());
        diagnostics.add_context("zone_rows", self.zone_rows.to_string());
        diagnostics.add_context("tcx_files", self.tcx_files.to_string());
        diagnostics.add_context(
            "activities_without_zones",
            self.activities_without_zones.to_string(),
        );
        diagnostics.add_context("failed_activities", self.failed_activities.len().to_string());
        for (log_id, reason) in &self.failed_activities {
            diagnostics
                .add_error_message(format!("Activity {}: {}", log_id, reason), "ExportError");
        }
    }
}

/// Writes every selected format into one output directory
pub struct ExportManager {
    output_dir: PathBuf,
    formats: Vec<ExportFormat>,
}

impl ExportManager {
    pub fn new(output_dir: impl Into<PathBuf>, formats: Vec<ExportFormat>) -> Self {
        Self {
            output_dir: output_dir.into(),
            formats,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn export_all(&self, data: &UserData) -> Result<ExportSummary, ExportError> {
        fs::create_dir_all(&self.output_dir)?;
        let mut summary = ExportSummary::default();

        if self.formats.contains(&ExportFormat::Csv) {
            let (path, rows) = csv::export_heart_rate_zones(&data.activities, &self.output_dir)?;
            summary.files.push(path);
            summary.zone_rows = rows;
            summary
                .files
                .push(csv::export_activities_summary(&data.activities, &self.output_dir)?);
            summary
                .files
                .push(csv::export_daily_metrics(&data.daily_metrics, &self.output_dir)?);
        }

        if self.formats.contains(&ExportFormat::Tcx) {
            let tcx_dir = self.output_dir.join("tcx");
            fs::create_dir_all(&tcx_dir)?;

            for activity in &data.activities {
                match tcx::TcxExporter::export_activity(activity, &tcx_dir) {
                    Ok(Some(path)) => {
                        summary.tcx_files += 1;
                        summary.files.push(path);
                    }
                    Ok(None) => summary.activities_without_zones += 1,
                    Err(e) => {
                        warn!(log_id = activity.log_id, error = %e, "Failed to write TCX file");
                        summary.failed_activities.push((activity.log_id, e.to_string()));
                    }
                }
            }
        }

        info!(
            files = summary.files.len(),
            zone_rows = summary.zone_rows,
            tcx_files = summary.tcx_files,
            failed = summary.failed_activities.len(),
            "Export finished in {}",
            self.output_dir.display()
        );

        Ok(summary)
    }
}
