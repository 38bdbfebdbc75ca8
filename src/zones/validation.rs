//! Structural and physiological checks on a zone set
//!
//! Findings are advisory. They are collected for diagnostics and never block
//! zone assignment or export.

use crate::models::HeartRateZone;

/// Lowest plausible human heart rate boundary
pub const MIN_PLAUSIBLE_BPM: u16 = 40;
/// Highest plausible human heart rate boundary
pub const MAX_PLAUSIBLE_BPM: u16 = 220;

/// A single problem found in a zone set. Zone numbers are 1-based positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneIssue {
    NoZones,
    Overlap { zone: usize, next: usize },
    Gap { zone: usize, next: usize },
    MinOutOfRange { zone: usize, bpm: u16 },
    MaxOutOfRange { zone: usize, bpm: u16 },
    InvalidRange { zone: usize, min_bpm: u16, max_bpm: u16 },
}

impl std::fmt::Display for ZoneIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneIssue::NoZones => write!(f, "no zones provided"),
            ZoneIssue::Overlap { zone, next } => {
                write!(f, "Zone {} overlaps with Zone {}", zone, next)
            }
            ZoneIssue::Gap { zone, next } => {
                write!(f, "Gap between Zone {} and Zone {}", zone, next)
            }
            ZoneIssue::MinOutOfRange { zone, bpm } => {
                write!(f, "Zone {} has unrealistic minimum heart rate: {}", zone, bpm)
            }
            ZoneIssue::MaxOutOfRange { zone, bpm } => {
                write!(f, "Zone {} has unrealistic maximum heart rate: {}", zone, bpm)
            }
            ZoneIssue::InvalidRange { zone, min_bpm, max_bpm } => {
                write!(f, "Zone {} has invalid range: {}-{}", zone, min_bpm, max_bpm)
            }
        }
    }
}

pub struct ZoneValidator;

impl ZoneValidator {
    /// Check a zone set; an empty result means the set is valid
    pub fn check(zones: &[HeartRateZone]) -> Vec<ZoneIssue> {
        if zones.is_empty() {
            return vec![ZoneIssue::NoZones];
        }

        // Zones without an index keep their relative order after indexed ones
        let mut ordered: Vec<&HeartRateZone> = zones.iter().collect();
        ordered.sort_by_key(|zone| zone.zone_index.unwrap_or(u8::MAX));

        let mut issues = Vec::new();

        for (i, pair) in ordered.windows(2).enumerate() {
            let (current, next) = (pair[0], pair[1]);
            if current.max_bpm >= next.min_bpm {
                issues.push(ZoneIssue::Overlap { zone: i + 1, next: i + 2 });
            }
        }

        for (i, pair) in ordered.windows(2).enumerate() {
            let (current, next) = (pair[0], pair[1]);
            if u32::from(current.max_bpm) + 1 < u32::from(next.min_bpm) {
                issues.push(ZoneIssue::Gap { zone: i + 1, next: i + 2 });
            }
        }

        let plausible = MIN_PLAUSIBLE_BPM..=MAX_PLAUSIBLE_BPM;
        for (i, zone) in ordered.iter().enumerate() {
            let number = i + 1;
            if !plausible.contains(&zone.min_bpm) {
                issues.push(ZoneIssue::MinOutOfRange { zone: number, bpm: zone.min_bpm });
            }
            if !plausible.contains(&zone.max_bpm) {
                issues.push(ZoneIssue::MaxOutOfRange { zone: number, bpm: zone.max_bpm });
            }
            if zone.min_bpm >= zone.max_bpm {
                issues.push(ZoneIssue::InvalidRange {
                    zone: number,
                    min_bpm: zone.min_bpm,
                    max_bpm: zone.max_bpm,
                });
            }
        }

        issues
    }

    /// Human-readable issue list
    pub fn validate(zones: &[HeartRateZone]) -> Vec<String> {
        Self::check(zones).iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(index: u8, min_bpm: u16, max_bpm: u16) -> HeartRateZone {
        let mut zone = HeartRateZone::new(format!("Zone {}", index), min_bpm, max_bpm, 0);
        zone.zone_index = Some(index);
        zone
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(ZoneValidator::validate(&[]), vec!["no zones provided".to_string()]);
    }

    #[test]
    fn test_overlap_detected() {
        let zones = vec![indexed(1, 100, 120), indexed(2, 115, 140)];
        let issues = ZoneValidator::check(&zones);
        assert_eq!(issues, vec![ZoneIssue::Overlap { zone: 1, next: 2 }]);
        assert_eq!(issues[0].to_string(), "Zone 1 overlaps with Zone 2");
    }

    #[test]
    fn test_gap_detected() {
        let zones = vec![indexed(1, 100, 120), indexed(2, 130, 140)];
        assert_eq!(ZoneValidator::check(&zones), vec![ZoneIssue::Gap { zone: 1, next: 2 }]);
    }

    #[test]
    fn test_contiguous_set_is_valid() {
        let zones = vec![indexed(1, 100, 119), indexed(2, 120, 139), indexed(3, 140, 160)];
        assert!(ZoneValidator::check(&zones).is_empty());
    }

    #[test]
    fn test_shared_boundary_counts_as_overlap() {
        let zones = vec![indexed(1, 125, 138), indexed(2, 138, 151)];
        assert_eq!(ZoneValidator::check(&zones), vec![ZoneIssue::Overlap { zone: 1, next: 2 }]);
    }

    #[test]
    fn test_out_of_range_and_inverted_zone() {
        let zones = vec![indexed(1, 30, 30)];
        let messages = ZoneValidator::validate(&zones);
        assert_eq!(
            messages,
            vec![
                "Zone 1 has unrealistic minimum heart rate: 30".to_string(),
                "Zone 1 has unrealistic maximum heart rate: 30".to_string(),
                "Zone 1 has invalid range: 30-30".to_string(),
            ]
        );
    }

    #[test]
    fn test_checks_follow_zone_index_order() {
        let zones = vec![indexed(2, 120, 139), indexed(1, 100, 119)];
        assert!(ZoneValidator::check(&zones).is_empty());
    }

    #[test]
    fn test_multiple_independent_issues() {
        let zones = vec![indexed(1, 100, 150), indexed(2, 140, 250), indexed(3, 255, 250)];
        let issues = ZoneValidator::check(&zones);
        assert!(issues.contains(&ZoneIssue::Overlap { zone: 1, next: 2 }));
        assert!(issues.contains(&ZoneIssue::Gap { zone: 2, next: 3 }));
        assert!(issues.contains(&ZoneIssue::MaxOutOfRange { zone: 2, bpm: 250 }));
        assert!(issues.contains(&ZoneIssue::MinOutOfRange { zone: 3, bpm: 255 }));
        assert!(issues.contains(&ZoneIssue::InvalidRange { zone: 3, min_bpm: 255, max_bpm: 250 }));
    }
}
