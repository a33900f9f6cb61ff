//! Fixed-width bit masks, indexed from the left.
//!
//! Index 0 is the most significant bit of a `width`-bit mask, so a weekly
//! mask `0b0101010` has Monday (1), Wednesday (3) and Friday (5) set.
//! Indices outside `0..width` select no bit: reads report `false` and
//! writes return the mask unchanged.

pub const DAYS_IN_WEEK: u32 = 7;
pub const DAYS_IN_MONTH: u32 = 31;
pub const DAYS_IN_TWO_WEEKS: u32 = 14;

fn bit_for(index: u32, width: u32) -> Option<u32> {
    if index >= width || width > u32::BITS {
        return None;
    }
    1u32.checked_shl(width - 1 - index)
}

#[must_use]
pub fn is_bit_set(bits: u32, index: u32, width: u32) -> bool {
    bit_for(index, width).is_some_and(|bit| bits & bit != 0)
}

#[must_use]
pub fn set_bit(bits: u32, index: u32, width: u32) -> u32 {
    bit_for(index, width).map_or(bits, |bit| bits | bit)
}

#[must_use]
pub fn unset_bit(bits: u32, index: u32, width: u32) -> u32 {
    bit_for(index, width).map_or(bits, |bit| bits & !bit)
}

/// Largest mask value that fits in `width` bits.
#[must_use]
pub fn full_mask(width: u32) -> u32 {
    if width >= u32::BITS {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// `day` is zero-indexed from Sunday.
#[must_use]
pub fn is_day_of_week_set(bits: u32, day: u32) -> bool {
    is_bit_set(bits, day, DAYS_IN_WEEK)
}

#[must_use]
pub fn set_day_of_week(bits: u32, day: u32) -> u32 {
    set_bit(bits, day, DAYS_IN_WEEK)
}

#[must_use]
pub fn unset_day_of_week(bits: u32, day: u32) -> u32 {
    unset_bit(bits, day, DAYS_IN_WEEK)
}

/// Three letter label of a day of week, zero-indexed from Sunday.
#[must_use]
pub fn day_to_str(day: u32) -> Option<&'static str> {
    match day {
        0 => Some("SUN"),
        1 => Some("MON"),
        2 => Some("TUE"),
        3 => Some("WED"),
        4 => Some("THU"),
        5 => Some("FRI"),
        6 => Some("SAT"),
        _ => None,
    }
}
