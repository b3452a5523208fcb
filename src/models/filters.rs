use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MedicineOrder {
    #[default]
    Name,
    RefillDate,
}

/// Predicate for medicine queries. Any refill bound excludes medicines
/// without a refill date.
#[derive(Debug, Clone, Default)]
pub struct MedicineFilter {
    pub active: Option<bool>,
    pub has_refill_date: bool,
    /// refill_date >= bound
    pub refill_from: Option<NaiveDateTime>,
    /// refill_date <= bound
    pub refill_until: Option<NaiveDateTime>,
    /// refill_date < bound
    pub refill_before: Option<NaiveDateTime>,
    /// Case-insensitive substring of the name or the category label.
    pub text: Option<String>,
    pub order: MedicineOrder,
}

impl MedicineFilter {
    pub fn active() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }

    /// Active medicines matching `query`. A blank query matches every one.
    pub fn search(query: &str) -> Self {
        let query = query.trim();
        Self {
            active: Some(true),
            text: (!query.is_empty()).then(|| query.to_string()),
            ..Self::default()
        }
    }

    /// Active medicines whose refill date lies in `[from, until]`.
    pub fn refill_between(from: NaiveDateTime, until: NaiveDateTime) -> Self {
        Self {
            active: Some(true),
            has_refill_date: true,
            refill_from: Some(from),
            refill_until: Some(until),
            order: MedicineOrder::RefillDate,
            ..Self::default()
        }
    }

    /// Active medicines whose refill date lies in `[from, before)`.
    pub fn refill_in_range(from: NaiveDateTime, before: NaiveDateTime) -> Self {
        Self {
            active: Some(true),
            has_refill_date: true,
            refill_from: Some(from),
            refill_before: Some(before),
            order: MedicineOrder::RefillDate,
            ..Self::default()
        }
    }

    /// Active medicines whose refill date is at or before `until`, overdue included.
    pub fn refill_until(until: NaiveDateTime) -> Self {
        Self {
            active: Some(true),
            has_refill_date: true,
            refill_until: Some(until),
            order: MedicineOrder::RefillDate,
            ..Self::default()
        }
    }

    /// Active medicines whose refill date is strictly before `before`.
    pub fn refill_before(before: NaiveDateTime) -> Self {
        Self {
            active: Some(true),
            has_refill_date: true,
            refill_before: Some(before),
            order: MedicineOrder::RefillDate,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DosageFilter {
    pub medicine_id: Option<Uuid>,
    /// scheduled_time >= bound
    pub scheduled_from: Option<NaiveDateTime>,
    /// scheduled_time < bound
    pub scheduled_before: Option<NaiveDateTime>,
}

impl DosageFilter {
    /// Doses scheduled within `[start of day, start of next day)`.
    pub fn day(day: NaiveDate) -> Self {
        let (start, end) = day_bounds(day);
        Self {
            medicine_id: None,
            scheduled_from: Some(start),
            scheduled_before: Some(end),
        }
    }

    pub fn medicine(medicine_id: Uuid) -> Self {
        Self {
            medicine_id: Some(medicine_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub medicine_id: Option<Uuid>,
    pub limit: Option<u32>,
}

/// Half-open local-time interval covering one calendar day.
pub fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = day.and_time(chrono::NaiveTime::MIN);
    let end = day
        .succ_opt()
        .map(|next| next.and_time(chrono::NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MAX);
    (start, end)
}
