use crate::models::HeartRateZone;

/// Carry observed minutes from the recorded zones onto a recalculated set.
///
/// Redistribution is positional: both sets are assumed to be ordered by
/// ascending intensity. When the recorded set is shorter, new zones past its
/// end receive half the minutes of the recorded zone `i - original_len`
/// (integer division); zones past twice the recorded length keep their
/// minutes. When the recorded set is at least as long, extra recorded zones
/// are dropped.
pub fn redistribute_zone_time(
    original: &[HeartRateZone],
    mut recalculated: Vec<HeartRateZone>,
) -> Vec<HeartRateZone> {
    if original.is_empty() || recalculated.is_empty() {
        return recalculated;
    }

    let original_len = original.len();

    if original_len < recalculated.len() {
        for (i, zone) in recalculated.iter_mut().enumerate() {
            if let Some(source) = original.get(i) {
                zone.minutes = source.minutes;
            } else if let Some(source) = original.get(i - original_len) {
                zone.minutes = source.minutes / 2;
            }
        }
    } else {
        for (zone, source) in recalculated.iter_mut().zip(original) {
            zone.minutes = source.minutes;
        }
    }

    recalculated
}
