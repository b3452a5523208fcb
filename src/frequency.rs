//! Frequency resolver: maps a dosing frequency onto fixed times of day.
//!
//! Pure and total. Unknown labels get a single 09:00 dose.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::Frequency;

fn hm(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Times of day for a frequency, ascending, seconds zero.
pub fn dose_times(frequency: &Frequency) -> Vec<NaiveTime> {
    let hours: &[u32] = match frequency {
        Frequency::OnceDaily => &[9],
        Frequency::TwiceDaily => &[9, 21],
        Frequency::ThreeTimesDaily => &[8, 14, 20],
        Frequency::FourTimesDaily => &[6, 12, 18, 22],
        Frequency::AsNeeded => &[9],
        Frequency::Other(_) => &[9],
    };
    hours.iter().copied().map(hm).collect()
}

/// Concrete scheduled timestamps for `day`.
pub fn resolve_for_day(frequency: &Frequency, day: NaiveDate) -> Vec<NaiveDateTime> {
    dose_times(frequency)
        .into_iter()
        .map(|t| day.and_time(t))
        .collect()
}

/// Same as [`resolve_for_day`] for a raw label, matched case-insensitively.
pub fn resolve_label(label: &str, day: NaiveDate) -> Vec<NaiveDateTime> {
    resolve_for_day(&Frequency::from(label.to_string()), day)
}
