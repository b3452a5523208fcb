//! Adherence and refill analysis.
//!
//! Pure helpers over already-loaded records plus store queries for the refill
//! buckets. Every bucket covers active medicines with a refill date only.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::db::{DatabaseError, MedicineStore};
use crate::models::filters::day_bounds;
use crate::models::{DosageInstance, Medicine, MedicineFilter};

/// Horizon of the upcoming-refills list.
pub const UPCOMING_REFILL_HORIZON_DAYS: i64 = 7;
/// Window used by the dashboard refill alert.
pub const REFILL_ALERT_WINDOW_DAYS: i64 = 4;
/// Label for medicines whose category is missing or unrecognised.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Fraction of doses taken. 0.0 for an empty schedule.
pub fn adherence_rate(dosages: &[DosageInstance]) -> f64 {
    if dosages.is_empty() {
        return 0.0;
    }
    let taken = dosages.iter().filter(|d| d.is_taken).count();
    taken as f64 / dosages.len() as f64
}

/// Whole days from `now` to `target`, truncated toward zero.
///
/// Counted on the wall clock: 3 days means `target` is at or past the same
/// time of day three calendar days later.
pub fn days_until(now: NaiveDateTime, target: NaiveDateTime) -> i64 {
    let mut days = (target.date() - now.date()).num_days();
    if days > 0 && target.time() < now.time() {
        days -= 1;
    } else if days < 0 && target.time() > now.time() {
        days += 1;
    }
    days
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefillStatus {
    Overdue,
    Today,
    Tomorrow,
    InDays(i64),
}

impl RefillStatus {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => Self::Overdue,
            0 => Self::Today,
            1 => Self::Tomorrow,
            d => Self::InDays(d),
        }
    }

    pub fn at(now: NaiveDateTime, refill_date: NaiveDateTime) -> Self {
        Self::from_days(days_until(now, refill_date))
    }

    pub fn label(&self) -> String {
        match self {
            Self::Overdue => "Overdue".to_string(),
            Self::Today => "Today".to_string(),
            Self::Tomorrow => "Tomorrow".to_string(),
            Self::InDays(d) => format!("{d} days"),
        }
    }

    /// Two days or less, including overdue.
    pub fn is_urgent(&self) -> bool {
        match self {
            Self::Overdue | Self::Today | Self::Tomorrow => true,
            Self::InDays(d) => *d <= 2,
        }
    }
}

/// Active medicines whose refill date has passed.
pub fn overdue_refills_at<S: MedicineStore>(
    store: &S,
    now: NaiveDateTime,
) -> Result<Vec<Medicine>, DatabaseError> {
    store.query_medicines(&MedicineFilter::refill_before(now))
}

pub fn overdue_refill_count_at<S: MedicineStore>(
    store: &S,
    now: NaiveDateTime,
) -> Result<u32, DatabaseError> {
    store.count_medicines(&MedicineFilter::refill_before(now))
}

/// Last instant a stored timestamp can hold while keeping its text sortable.
fn latest_bound() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
        .unwrap_or(NaiveDateTime::MAX)
}

/// `now + days`, saturated at [`latest_bound`]. `None` for negative `days`.
fn window_end(now: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    if days < 0 {
        return None;
    }
    let end = TimeDelta::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .unwrap_or(NaiveDateTime::MAX);
    Some(end.min(latest_bound()))
}

/// Refill date within `[now, now + days]`, both ends inclusive, soonest first.
/// A negative `days` is an empty window.
pub fn refills_due_within_days_at<S: MedicineStore>(
    store: &S,
    now: NaiveDateTime,
    days: i64,
) -> Result<Vec<Medicine>, DatabaseError> {
    match window_end(now, days) {
        Some(end) => store.query_medicines(&MedicineFilter::refill_between(now, end)),
        None => Ok(Vec::new()),
    }
}

/// The seven-day upcoming list, soonest first.
pub fn upcoming_refills_at<S: MedicineStore>(
    store: &S,
    now: NaiveDateTime,
) -> Result<Vec<Medicine>, DatabaseError> {
    refills_due_within_days_at(store, now, UPCOMING_REFILL_HORIZON_DAYS)
}

/// Medicines the refill alert reports on: overdue ones plus those due within
/// [`REFILL_ALERT_WINDOW_DAYS`], soonest first.
pub fn refill_alerts_at<S: MedicineStore>(
    store: &S,
    now: NaiveDateTime,
) -> Result<Vec<Medicine>, DatabaseError> {
    let end = window_end(now, REFILL_ALERT_WINDOW_DAYS).unwrap_or(now);
    store.query_medicines(&MedicineFilter::refill_until(end))
}

/// Refill date anywhere on today's calendar day, including earlier today.
pub fn refills_due_today_at<S: MedicineStore>(
    store: &S,
    now: NaiveDateTime,
) -> Result<Vec<Medicine>, DatabaseError> {
    let (start, end) = day_bounds(now.date());
    store.query_medicines(&MedicineFilter::refill_in_range(start, end))
}

pub fn refills_due_tomorrow_at<S: MedicineStore>(
    store: &S,
    now: NaiveDateTime,
) -> Result<Vec<Medicine>, DatabaseError> {
    let Some(tomorrow) = now.date().succ_opt() else {
        return Ok(Vec::new());
    };
    let (start, end) = day_bounds(tomorrow);
    store.query_medicines(&MedicineFilter::refill_in_range(start, end))
}

/// Active medicines grouped by category label.
pub fn category_counts(medicines: &[Medicine]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for medicine in medicines.iter().filter(|m| m.is_active) {
        let label = medicine
            .category
            .map(|c| c.as_str())
            .unwrap_or(UNKNOWN_CATEGORY);
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Dashboard text for the medicines inside the refill alert window.
/// `None` when there is nothing to report.
pub fn refill_alert_message(medicines: &[Medicine], now: NaiveDateTime) -> Option<String> {
    match medicines {
        [] => None,
        [single] => {
            let days = single
                .refill_date
                .map(|date| days_until(now, date))
                .unwrap_or(0);
            let when = match days {
                d if d < 0 => "now, it is overdue.".to_string(),
                0 => "today!".to_string(),
                1 => "tomorrow.".to_string(),
                d => format!("in {d} days."),
            };
            Some(format!("{} needs to be refilled {when}", single.name))
        }
        many => {
            let overdue = many
                .iter()
                .filter(|m| m.refill_date.is_some_and(|date| date < now))
                .count();
            let upcoming = many.len() - overdue;

            let mut parts = Vec::new();
            if overdue > 0 {
                parts.push(format!("{overdue} overdue refill{}", plural(overdue)));
            }
            if upcoming > 0 {
                parts.push(format!("{upcoming} upcoming refill{}", plural(upcoming)));
            }
            Some(format!(
                "You have {} within {REFILL_ALERT_WINDOW_DAYS} days.",
                parts.join(" and ")
            ))
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Snapshot for the dashboard header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub total_medicines: u32,
    pub doses_taken: u32,
    pub doses_pending: u32,
    pub adherence_rate: f64,
    pub overdue_refills: u32,
    pub upcoming_refills: u32,
}

impl DailySummary {
    pub fn compute(
        total_medicines: u32,
        today: &[DosageInstance],
        overdue_refills: u32,
        upcoming_refills: u32,
    ) -> Self {
        let taken = today.iter().filter(|d| d.is_taken).count() as u32;
        Self {
            total_medicines,
            doses_taken: taken,
            doses_pending: today.len() as u32 - taken,
            adherence_rate: adherence_rate(today),
            overdue_refills,
            upcoming_refills,
        }
    }
}
