//! Zone boundary calculation from a user profile
//!
//! Two methods are supported:
//! - percentage of max HR, used when only the max heart rate is known
//! - heart rate reserve (Karvonen), used when both max and resting are known
//!
//! Both produce the canonical 5-zone set covering 50-100% of the base.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ZoneError;
use crate::models::{HeartRateZone, UserProfile};

/// Age-based maximum heart rate formulas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxHrFormula {
    /// 208 - 0.7 x age
    #[default]
    Tanaka,
    /// 220 - age
    Fox,
    /// 207 - 0.7 x age
    Gellish,
    /// 211 - 0.64 x age
    Nes,
}

impl MaxHrFormula {
    /// Estimate max heart rate for an age, truncated to whole bpm.
    ///
    /// Returns `None` when the formula yields a value outside `u16`.
    pub fn estimate(&self, age: u16) -> Option<u16> {
        let age = Decimal::from(age);
        let estimate = match self {
            MaxHrFormula::Tanaka => dec!(208) - dec!(0.7) * age,
            MaxHrFormula::Fox => dec!(220) - age,
            MaxHrFormula::Gellish => dec!(207) - dec!(0.7) * age,
            MaxHrFormula::Nes => dec!(211) - dec!(0.64) * age,
        };
        estimate.trunc().to_u16()
    }
}

impl std::str::FromStr for MaxHrFormula {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tanaka" => Ok(MaxHrFormula::Tanaka),
            "fox" => Ok(MaxHrFormula::Fox),
            "gellish" => Ok(MaxHrFormula::Gellish),
            "nes" => Ok(MaxHrFormula::Nes),
            _ => Err(ZoneError::UnknownFormula(s.to_string())),
        }
    }
}

impl std::fmt::Display for MaxHrFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxHrFormula::Tanaka => write!(f, "tanaka"),
            MaxHrFormula::Fox => write!(f, "fox"),
            MaxHrFormula::Gellish => write!(f, "gellish"),
            MaxHrFormula::Nes => write!(f, "nes"),
        }
    }
}

/// Estimate max heart rate from age with the given formula
pub fn estimate_max_heart_rate(age: u16, formula: MaxHrFormula) -> Option<u16> {
    formula.estimate(age)
}

/// Heart rate reserve (max - resting), signed so implausible inputs stay visible
pub fn calculate_heart_rate_reserve(max_hr: u16, resting_hr: u16) -> i32 {
    i32::from(max_hr) - i32::from(resting_hr)
}

/// One row of a zone naming table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneDefinition {
    pub index: u8,
    pub name: &'static str,
    pub min_pct: u8,
    pub max_pct: u8,
    pub garmin_name: &'static str,
}

impl ZoneDefinition {
    const fn band(
        index: u8,
        name: &'static str,
        min_pct: u8,
        max_pct: u8,
        garmin_name: &'static str,
    ) -> Self {
        Self {
            index,
            name,
            min_pct,
            max_pct,
            garmin_name,
        }
    }

    /// Midpoint of the band in percent
    pub fn midpoint_pct(&self) -> Decimal {
        Decimal::from(u16::from(self.min_pct) + u16::from(self.max_pct)) / dec!(2)
    }
}

const FIVE_ZONE_SYSTEM: [ZoneDefinition; 5] = [
    ZoneDefinition::band(1, "Recovery", 50, 60, "Zone 1"),
    ZoneDefinition::band(2, "Aerobic", 60, 70, "Zone 2"),
    ZoneDefinition::band(3, "Tempo", 70, 80, "Zone 3"),
    ZoneDefinition::band(4, "Threshold", 80, 90, "Zone 4"),
    ZoneDefinition::band(5, "Anaerobic", 90, 100, "Zone 5"),
];

const GARMIN_STANDARD: [ZoneDefinition; 5] = [
    ZoneDefinition::band(1, "Active Recovery", 50, 60, "Zone 1"),
    ZoneDefinition::band(2, "Aerobic Base", 60, 70, "Zone 2"),
    ZoneDefinition::band(3, "Aerobic", 70, 80, "Zone 3"),
    ZoneDefinition::band(4, "Lactate Threshold", 80, 90, "Zone 4"),
    ZoneDefinition::band(5, "Neuromuscular", 90, 100, "Zone 5"),
];

/// Zone naming tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSystem {
    /// Generic 5-zone names (Recovery .. Anaerobic)
    FiveZone,
    /// Target-platform flavoured names (Active Recovery .. Neuromuscular)
    #[default]
    GarminStandard,
}

impl ZoneSystem {
    pub fn definitions(&self) -> &'static [ZoneDefinition; 5] {
        match self {
            ZoneSystem::FiveZone => &FIVE_ZONE_SYSTEM,
            ZoneSystem::GarminStandard => &GARMIN_STANDARD,
        }
    }
}

impl std::str::FromStr for ZoneSystem {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "five_zone" | "5_zone" | "5_zone_system" => Ok(ZoneSystem::FiveZone),
            "garmin_standard" | "garmin" => Ok(ZoneSystem::GarminStandard),
            _ => Err(ZoneError::UnknownZoneSystem(s.to_string())),
        }
    }
}

impl std::fmt::Display for ZoneSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneSystem::FiveZone => write!(f, "five_zone"),
            ZoneSystem::GarminStandard => write!(f, "garmin_standard"),
        }
    }
}

/// Which calculation produced a zone set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneMethod {
    /// Heart rate reserve (max and resting known)
    Karvonen,
    /// Percentage of max HR (only max known)
    PercentageMaxHr,
    /// Proportional split of the legacy 3-bucket zones
    LegacyMapping,
}

impl std::fmt::Display for ZoneMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneMethod::Karvonen => write!(f, "karvonen"),
            ZoneMethod::PercentageMaxHr => write!(f, "percentage"),
            ZoneMethod::LegacyMapping => write!(f, "legacy-mapping"),
        }
    }
}

/// Derives zone boundaries from a shared, read-only profile
#[derive(Debug, Clone)]
pub struct ZoneCalculator {
    profile: UserProfile,
    formula: MaxHrFormula,
    system: ZoneSystem,
}

impl ZoneCalculator {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            formula: MaxHrFormula::default(),
            system: ZoneSystem::default(),
        }
    }

    pub fn with_formula(mut self, formula: MaxHrFormula) -> Self {
        self.formula = formula;
        self
    }

    pub fn with_zone_system(mut self, system: ZoneSystem) -> Self {
        self.system = system;
        self
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn zone_system(&self) -> ZoneSystem {
        self.system
    }

    /// Measured max HR, else an age-based estimate, else unavailable
    pub fn effective_max_heart_rate(&self) -> Option<u16> {
        match self.profile.max_heart_rate.filter(|hr| *hr > 0) {
            Some(measured) => Some(measured),
            None => self
                .profile
                .age
                .filter(|age| *age > 0)
                .and_then(|age| self.formula.estimate(age)),
        }
    }

    /// Measured resting HR, else a fitness-level heuristic, else unavailable
    pub fn effective_resting_heart_rate(&self) -> Option<u16> {
        match self.profile.resting_heart_rate.filter(|hr| *hr > 0) {
            Some(measured) => Some(measured),
            None => self
                .profile
                .fitness_level
                .map(|level| level.estimated_resting_heart_rate()),
        }
    }

    /// Method the profile supports, `None` when no max HR can be resolved
    pub fn method(&self) -> Option<ZoneMethod> {
        match (
            self.effective_max_heart_rate(),
            self.effective_resting_heart_rate(),
        ) {
            (Some(_), Some(_)) => Some(ZoneMethod::Karvonen),
            (Some(_), None) => Some(ZoneMethod::PercentageMaxHr),
            (None, _) => None,
        }
    }

    /// Calculate zones with the preferred method; empty if max HR is unavailable
    pub fn calculate_zones(&self) -> Result<Vec<HeartRateZone>, ZoneError> {
        match (
            self.effective_max_heart_rate(),
            self.effective_resting_heart_rate(),
        ) {
            (Some(max_hr), Some(resting_hr)) => self.karvonen_zones(max_hr, resting_hr),
            (Some(max_hr), None) => self.percentage_zones(max_hr),
            (None, _) => Ok(Vec::new()),
        }
    }

    /// Zones as fixed percentages of max HR:
    /// `bpm = floor(pct / 100 x max_hr)` for both band edges
    pub fn percentage_zones(&self, max_hr: u16) -> Result<Vec<HeartRateZone>, ZoneError> {
        let max_hr = Decimal::from(max_hr);

        self.system
            .definitions()
            .iter()
            .map(|def| {
                let min_bpm = to_bpm(def.index, Decimal::from(def.min_pct) / dec!(100) * max_hr)?;
                let max_bpm = to_bpm(def.index, Decimal::from(def.max_pct) / dec!(100) * max_hr)?;

                let mut zone = build_zone(def, min_bpm, max_bpm);
                zone.percentage_max_hr = Some(def.midpoint_pct());
                Ok(zone)
            })
            .collect()
    }

    /// Zones from heart rate reserve:
    /// `bpm = floor(reserve x pct / 100) + resting_hr` for both band edges
    pub fn karvonen_zones(
        &self,
        max_hr: u16,
        resting_hr: u16,
    ) -> Result<Vec<HeartRateZone>, ZoneError> {
        let reserve = Decimal::from(calculate_heart_rate_reserve(max_hr, resting_hr));
        let resting = Decimal::from(resting_hr);

        self.system
            .definitions()
            .iter()
            .map(|def| {
                let min_bpm = to_bpm(
                    def.index,
                    reserve * Decimal::from(def.min_pct) / dec!(100) + resting,
                )?;
                let max_bpm = to_bpm(
                    def.index,
                    reserve * Decimal::from(def.max_pct) / dec!(100) + resting,
                )?;

                let mut zone = build_zone(def, min_bpm, max_bpm);
                zone.percentage_max_hr = Some(def.midpoint_pct());
                zone.percentage_hr_reserve = Some(def.midpoint_pct());
                Ok(zone)
            })
            .collect()
    }
}

fn build_zone(def: &ZoneDefinition, min_bpm: u16, max_bpm: u16) -> HeartRateZone {
    let mut zone = HeartRateZone::new(def.name, min_bpm, max_bpm, 0);
    zone.zone_index = Some(def.index);
    zone.garmin_zone_name = Some(def.garmin_name.to_string());
    zone
}

/// Checked conversion of a floored boundary. For `u16` inputs both methods
/// stay within `[0, max(max_hr, resting_hr)]`, so the error arm guards the
/// conversion only.
fn to_bpm(zone: u8, value: Decimal) -> Result<u16, ZoneError> {
    value
        .floor()
        .to_u16()
        .ok_or_else(|| ZoneError::BoundaryOutOfRange {
            zone,
            value: value.floor().to_string(),
        })
}
