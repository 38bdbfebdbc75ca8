//! Heart rate zone reconciliation
//!
//! Turns the source system's recorded zones into the target platform's
//! canonical 5-zone scheme:
//!
//! 1. [`ProfileEstimator`] infers one [`UserProfile`] per data set.
//! 2. [`ZoneCalculator`] derives boundaries (Karvonen or percentage of max).
//! 3. [`ZoneMapper`] splits legacy buckets when no max HR is available.
//! 4. [`redistribute_zone_time`] carries recorded minutes onto the new set.
//! 5. [`ZoneValidator`] reports structural and physiological problems.
//!
//! The profile is passed in as a value and only read afterwards, so one
//! [`ZoneReconciler`] can be shared by parallel workers.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::logging::DiagnosticReport;
use crate::models::{ActivityRecord, HeartRateZone, UserProfile};

pub mod calculator;
pub mod mapper;
pub mod profile;
pub mod redistribute;
pub mod validation;

pub use calculator::{
    calculate_heart_rate_reserve, estimate_max_heart_rate, MaxHrFormula, ZoneCalculator,
    ZoneDefinition, ZoneMethod, ZoneSystem,
};
pub use mapper::{LegacyZone, ZoneMapper};
pub use profile::ProfileEstimator;
pub use redistribute::redistribute_zone_time;
pub use validation::{ZoneIssue, ZoneValidator};

/// Errors that can occur during zone reconciliation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    #[error("Zone {zone} boundary out of range: {value} bpm")]
    BoundaryOutOfRange { zone: u8, value: String },
    #[error("Unknown max heart rate formula: {0}")]
    UnknownFormula(String),
    #[error("Unknown zone system: {0}")]
    UnknownZoneSystem(String),
}

/// Result of recalculating one activity
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityOutcome {
    /// Method that produced the zones, `None` when nothing could be computed
    pub method: Option<ZoneMethod>,
    /// Validator findings for the produced zones
    pub issues: Vec<ZoneIssue>,
}

/// Applies the zone engine to activities using one shared profile
#[derive(Debug, Clone)]
pub struct ZoneReconciler {
    calculator: ZoneCalculator,
}

impl ZoneReconciler {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            calculator: ZoneCalculator::new(profile),
        }
    }

    pub fn with_formula(mut self, formula: MaxHrFormula) -> Self {
        self.calculator = self.calculator.with_formula(formula);
        self
    }

    pub fn with_zone_system(mut self, system: ZoneSystem) -> Self {
        self.calculator = self.calculator.with_zone_system(system);
        self
    }

    pub fn calculator(&self) -> &ZoneCalculator {
        &self.calculator
    }

    pub fn profile(&self) -> &UserProfile {
        self.calculator.profile()
    }

    /// Recalculate the zones of one activity in place.
    ///
    /// On error the activity is left untouched, keeping only its recorded zones.
    pub fn recalculate_activity(
        &self,
        activity: &mut ActivityRecord,
    ) -> Result<ActivityOutcome, ZoneError> {
        let max_hr = self.calculator.effective_max_heart_rate();
        let resting_hr = self.calculator.effective_resting_heart_rate();

        let (method, zones) = match (max_hr, resting_hr) {
            (Some(max_hr), Some(resting_hr)) => (
                Some(ZoneMethod::Karvonen),
                self.calculator.karvonen_zones(max_hr, resting_hr)?,
            ),
            (Some(max_hr), None) => (
                Some(ZoneMethod::PercentageMaxHr),
                self.calculator.percentage_zones(max_hr)?,
            ),
            (None, _) if !activity.heart_rate_zones.is_empty() => (
                Some(ZoneMethod::LegacyMapping),
                ZoneMapper::map_legacy_zones(&activity.heart_rate_zones),
            ),
            (None, _) => (None, Vec::new()),
        };

        let zones = redistribute_zone_time(&activity.heart_rate_zones, zones);
        let issues = if zones.is_empty() {
            Vec::new()
        } else {
            ZoneValidator::check(&zones)
        };

        for issue in &issues {
            debug!(log_id = activity.log_id, %issue, "Zone validation issue");
        }

        activity.max_heart_rate_calculated = max_hr;
        activity.resting_heart_rate = resting_hr;
        activity.heart_rate_reserve = match (max_hr, resting_hr) {
            (Some(max_hr), Some(resting_hr)) => {
                Some(calculate_heart_rate_reserve(max_hr, resting_hr))
            }
            _ => None,
        };
        activity.recalculated_hr_zones = zones;

        Ok(ActivityOutcome { method, issues })
    }

    /// Recalculate every activity, isolating per-activity failures
    pub fn recalculate_all(&self, activities: &mut [ActivityRecord]) -> ReconciliationReport {
        let outcomes: Vec<(i64, Result<ActivityOutcome, ZoneError>)> = activities
            .par_iter_mut()
            .map(|activity| (activity.log_id, self.recalculate_activity(activity)))
            .collect();

        let mut report = ReconciliationReport {
            total: outcomes.len(),
            ..ReconciliationReport::default()
        };

        for (log_id, outcome) in outcomes {
            match outcome {
                Ok(outcome) => report.record(log_id, outcome),
                Err(e) => {
                    warn!(log_id, error = %e, "Zone recalculation failed, keeping recorded zones");
                    report.failed.push((log_id, e.to_string()));
                }
            }
        }

        debug!(
            total = report.total,
            karvonen = report.karvonen,
            percentage = report.percentage,
            mapped = report.mapped,
            skipped = report.skipped,
            failed = report.failed.len(),
            "Zone reconciliation finished"
        );

        report
    }

    /// Boundaries the profile produces, without any recorded minutes
    pub fn preview_zones(&self) -> Result<Vec<HeartRateZone>, ZoneError> {
        self.calculator.calculate_zones()
    }
}

/// Batch summary of zone reconciliation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub total: usize,
    pub karvonen: usize,
    pub percentage: usize,
    pub mapped: usize,
    /// Activities for which no zone set could be produced
    pub skipped: usize,
    /// Activities whose recalculation failed, with the reason
    pub failed: Vec<(i64, String)>,
    /// Validation findings per activity
    pub issues: Vec<(i64, Vec<String>)>,
}

impl ReconciliationReport {
    fn record(&mut self, log_id: i64, outcome: ActivityOutcome) {
        match outcome.method {
            Some(ZoneMethod::Karvonen) => self.karvonen += 1,
            Some(ZoneMethod::PercentageMaxHr) => self.percentage += 1,
            Some(ZoneMethod::LegacyMapping) => self.mapped += 1,
            None => self.skipped += 1,
        }

        if !outcome.issues.is_empty() {
            let messages = outcome.issues.iter().map(ToString::to_string).collect();
            self.issues.push((log_id, messages));
        }
    }

    pub fn recalculated(&self) -> usize {
        self.karvonen + self.percentage + self.mapped
    }

    pub fn issue_count(&self) -> usize {
        self.issues.iter().map(|(_, issues)| issues.len()).sum()
    }

    /// Fold the findings into a run's diagnostic report
    pub fn add_to_diagnostics(&self, diagnostics: &mut DiagnosticReport) {
        diagnostics.add_context("activities", self.total.to_string());
        diagnostics.add_context("zones_karvonen", self.karvonen.to_string());
        diagnostics.add_context("zones_percentage", self.percentage.to_string());
        diagnostics.add_context("zones_mapped", self.mapped.to_string());
        diagnostics.add_context("zones_skipped", self.skipped.to_string());

        for (log_id, reason) in &self.failed {
            diagnostics
                .add_warning(format!("Activity {}: recalculation failed: {}", log_id, reason));
        }
        for (log_id, issues) in &self.issues {
            for issue in issues {
                diagnostics.add_warning(format!("Activity {}: {}", log_id, issue));
            }
        }
    }

    pub fn to_string_pretty(&self) -> String {
        format!(
            "Zone Reconciliation Summary\n  \
             Activities: {}\n  \
             Karvonen: {}\n  \
             Percentage of max: {}\n  \
             Legacy mapping: {}\n  \
             No zones: {}\n  \
             Failed: {}\n  \
             Validation issues: {}",
            self.total,
            self.karvonen,
            self.percentage,
            self.mapped,
            self.skipped,
            self.failed.len(),
            self.issue_count()
        )
    }
}
