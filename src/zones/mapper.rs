//! Fallback mapping from the legacy 3-bucket scheme onto the 5-zone scheme
//!
//! Used only when no max heart rate can be resolved, so that some time-in-zone
//! signal survives the conversion.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::HeartRateZone;

/// Named buckets of the source system's zone scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyZone {
    FatBurn,
    Cardio,
    Peak,
    OutOfRange,
}

/// Target zone index and share of the source minutes it receives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneSplit {
    pub target_index: u8,
    pub ratio: Decimal,
}

const FAT_BURN_SPLIT: [ZoneSplit; 2] = [
    ZoneSplit { target_index: 1, ratio: dec!(0.6) },
    ZoneSplit { target_index: 2, ratio: dec!(0.4) },
];

const CARDIO_SPLIT: [ZoneSplit; 2] = [
    ZoneSplit { target_index: 3, ratio: dec!(0.5) },
    ZoneSplit { target_index: 4, ratio: dec!(0.5) },
];

const PEAK_SPLIT: [ZoneSplit; 1] = [ZoneSplit { target_index: 5, ratio: dec!(1.0) }];

impl LegacyZone {
    /// Match a recorded zone name exactly; anything else is not a legacy bucket
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Fat Burn" => Some(LegacyZone::FatBurn),
            "Cardio" => Some(LegacyZone::Cardio),
            "Peak" => Some(LegacyZone::Peak),
            "Out of Range" => Some(LegacyZone::OutOfRange),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LegacyZone::FatBurn => "Fat Burn",
            LegacyZone::Cardio => "Cardio",
            LegacyZone::Peak => "Peak",
            LegacyZone::OutOfRange => "Out of Range",
        }
    }

    /// Target zones this bucket feeds; empty for minutes that are discarded
    pub fn splits(&self) -> &'static [ZoneSplit] {
        match self {
            LegacyZone::FatBurn => &FAT_BURN_SPLIT,
            LegacyZone::Cardio => &CARDIO_SPLIT,
            LegacyZone::Peak => &PEAK_SPLIT,
            LegacyZone::OutOfRange => &[],
        }
    }
}

/// Number of zones in the canonical target scheme
pub const TARGET_ZONE_COUNT: u8 = 5;

pub struct ZoneMapper;

impl ZoneMapper {
    /// Five empty target zones: indices 1-5, zero boundaries, zero minutes
    pub fn empty_target_zones() -> Vec<HeartRateZone> {
        (1..=TARGET_ZONE_COUNT)
            .map(|index| {
                let label = format!("Zone {}", index);
                let mut zone = HeartRateZone::new(label.clone(), 0, 0, 0);
                zone.zone_index = Some(index);
                zone.garmin_zone_name = Some(label);
                zone
            })
            .collect()
    }

    /// Split legacy bucket minutes across the five target zones.
    ///
    /// Each mapped target receives `floor(minutes x ratio)`, accumulated over
    /// every source bucket and saturating at `u32::MAX`. A non-zero source
    /// boundary overwrites the target boundary; when two sources feed one
    /// target the last one wins.
    pub fn map_legacy_zones(legacy: &[HeartRateZone]) -> Vec<HeartRateZone> {
        let mut targets = Self::empty_target_zones();

        for source in legacy {
            let Some(bucket) = LegacyZone::from_name(&source.name) else {
                tracing::debug!(zone = %source.name, "Ignoring zone outside the legacy scheme");
                continue;
            };

            for split in bucket.splits() {
                let Some(target) = targets.get_mut(usize::from(split.target_index) - 1) else {
                    continue;
                };

                let share = (Decimal::from(source.minutes) * split.ratio)
                    .floor()
                    .to_u32()
                    .unwrap_or(0);

                target.minutes = target.minutes.saturating_add(share);

                if source.min_bpm > 0 {
                    target.min_bpm = source.min_bpm;
                }
                if source.max_bpm > 0 {
                    target.max_bpm = source.max_bpm;
                }
            }
        }

        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(zones: &[HeartRateZone]) -> Vec<u32> {
        zones.iter().map(|z| z.minutes).collect()
    }

    #[test]
    fn test_fat_burn_and_peak_split() {
        let legacy = vec![
            HeartRateZone::new("Fat Burn", 0, 0, 100),
            HeartRateZone::new("Peak", 0, 0, 50),
        ];
        let zones = ZoneMapper::map_legacy_zones(&legacy);
        assert_eq!(minutes(&zones), vec![60, 40, 0, 0, 50]);
    }

    #[test]
    fn test_split_floors_each_share() {
        let legacy = vec![
            HeartRateZone::new("Fat Burn", 0, 0, 7),
            HeartRateZone::new("Cardio", 0, 0, 5),
        ];
        let zones = ZoneMapper::map_legacy_zones(&legacy);
        // 4.2 -> 4, 2.8 -> 2, 2.5 -> 2, 2.5 -> 2
        assert_eq!(minutes(&zones), vec![4, 2, 2, 2, 0]);
    }

    #[test]
    fn test_out_of_range_and_unknown_names_are_dropped() {
        let legacy = vec![
            HeartRateZone::new("Out of Range", 30, 97, 300),
            HeartRateZone::new("Vigorous", 150, 170, 20),
        ];
        let zones = ZoneMapper::map_legacy_zones(&legacy);
        assert_eq!(minutes(&zones), vec![0, 0, 0, 0, 0]);
        assert!(zones.iter().all(|z| z.min_bpm == 0 && z.max_bpm == 0));
    }

    #[test]
    fn test_empty_input_yields_zeroed_targets() {
        let zones = ZoneMapper::map_legacy_zones(&[]);
        assert_eq!(zones.len(), 5);
        assert_eq!(zones[2].name, "Zone 3");
        assert_eq!(zones[2].zone_index, Some(3));
        assert_eq!(minutes(&zones), vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_boundaries_copied_when_non_zero() {
        let legacy = vec![
            HeartRateZone::new("Cardio", 137, 166, 30),
            HeartRateZone::new("Peak", 0, 220, 4),
        ];
        let zones = ZoneMapper::map_legacy_zones(&legacy);
        assert_eq!((zones[2].min_bpm, zones[2].max_bpm), (137, 166));
        assert_eq!((zones[3].min_bpm, zones[3].max_bpm), (137, 166));
        assert_eq!((zones[4].min_bpm, zones[4].max_bpm), (0, 220));
    }

    #[test]
    fn test_repeated_bucket_accumulates_and_last_boundary_wins() {
        let legacy = vec![
            HeartRateZone::new("Peak", 160, 200, 10),
            HeartRateZone::new("Peak", 165, 210, 6),
        ];
        let zones = ZoneMapper::map_legacy_zones(&legacy);
        assert_eq!(zones[4].minutes, 16);
        assert_eq!((zones[4].min_bpm, zones[4].max_bpm), (165, 210));
    }

    #[test]
    fn test_minutes_saturate_instead_of_failing() {
        let legacy = vec![
            HeartRateZone::new("Fat Burn", 98, 137, u32::MAX),
            HeartRateZone::new("Fat Burn", 98, 137, u32::MAX),
            HeartRateZone::new("Peak", 0, 0, u32::MAX),
            HeartRateZone::new("Peak", 0, 0, 1),
        ];
        let zones = ZoneMapper::map_legacy_zones(&legacy);
        assert_eq!(zones.len(), 5);
        assert_eq!(zones[0].minutes, u32::MAX);
        assert_eq!(zones[1].minutes, 3_435_973_836);
        assert_eq!(zones[4].minutes, u32::MAX);
        assert_eq!((zones[0].min_bpm, zones[0].max_bpm), (98, 137));
    }

    #[test]
    fn test_legacy_names_round_trip() {
        for bucket in [
            LegacyZone::FatBurn,
            LegacyZone::Cardio,
            LegacyZone::Peak,
            LegacyZone::OutOfRange,
        ] {
            assert_eq!(LegacyZone::from_name(bucket.name()), Some(bucket));
        }
        assert_eq!(LegacyZone::from_name("fat burn"), None);
    }
}
