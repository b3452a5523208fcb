//! Daily schedule generator.
//!
//! The dose list for a day is rebuilt from scratch every time: existing
//! instances in the day's interval are deleted and one pending instance is
//! created per resolved time of every active medicine. Identifiers change on
//! each rebuild; the (medicine, scheduled time) pairs do not.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::db::{DatabaseError, MedicineStore};
use crate::frequency;
use crate::history;
use crate::models::{DosageFilter, DosageInstance, MedicineFilter};

/// Rebuilds `day` inside one transaction and returns the fresh schedule,
/// earliest first.
pub fn rebuild_day<S: MedicineStore>(
    store: &S,
    day: NaiveDate,
) -> Result<Vec<DosageInstance>, DatabaseError> {
    let day_filter = DosageFilter::day(day);

    let (removed, created) = store.with_transaction(|s| {
        let removed = s.delete_dosages(&day_filter)?;
        let mut created = 0usize;
        for medicine in s.query_medicines(&MedicineFilter::active())? {
            for slot in frequency::resolve_for_day(&medicine.frequency, day) {
                s.insert_dosage(&DosageInstance::pending(medicine.id, slot))?;
                created += 1;
            }
        }
        Ok((removed, created))
    })?;

    tracing::info!(%day, removed, created, "Dosage schedule regenerated");
    store.query_dosages(&day_filter)
}

/// Storage failures are logged and yield an empty schedule.
pub fn regenerate_for_day<S: MedicineStore>(store: &S, day: NaiveDate) -> Vec<DosageInstance> {
    match rebuild_day(store, day) {
        Ok(dosages) => dosages,
        Err(e) => {
            tracing::error!(%day, error = %e, "Failed to regenerate dosage schedule");
            Vec::new()
        }
    }
}

/// Current schedule for `day` without rebuilding it.
pub fn dosages_for_day<S: MedicineStore>(store: &S, day: NaiveDate) -> Vec<DosageInstance> {
    store
        .query_dosages(&DosageFilter::day(day))
        .unwrap_or_else(|e| {
            tracing::error!(%day, error = %e, "Failed to fetch dosages");
            Vec::new()
        })
}

/// Flips a dose's taken state and records the change in history.
/// Returns `None` when the dose no longer exists.
pub fn toggle_dosage<S: MedicineStore>(
    store: &S,
    dosage_id: &Uuid,
    now: NaiveDateTime,
) -> Result<Option<DosageInstance>, DatabaseError> {
    store.with_transaction(|s| {
        let Some(mut dosage) = s.get_dosage(dosage_id)? else {
            return Ok(None);
        };
        dosage.toggle_taken(now);
        s.update_dosage(&dosage)?;

        if s.get_medicine(&dosage.medicine_id)?.is_some() {
            history::append(
                s,
                dosage.medicine_id,
                history::dosage_action(dosage.is_taken),
                history::dosage_notes(dosage.scheduled_time.time()),
                now,
            )?;
        }
        Ok(Some(dosage))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::models::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 17).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn add(store: &SqliteStore, name: &str, frequency: Frequency) -> Medicine {
        let mut input = MedicineInput::new(name, "100mg");
        input.frequency = frequency;
        let med = input.into_medicine(at(8, 0));
        store.insert_medicine(&med).unwrap();
        med
    }

    fn pairs(dosages: &[DosageInstance]) -> Vec<(Uuid, NaiveDateTime)> {
        dosages.iter().map(|d| (d.medicine_id, d.scheduled_time)).collect()
    }

    #[test]
    fn once_daily_yields_single_morning_dose() {
        let store = SqliteStore::open_in_memory().unwrap();
        let med = add(&store, "Aspirin", Frequency::OnceDaily);

        let schedule = regenerate_for_day(&store, day());
        assert_eq!(pairs(&schedule), vec![(med.id, at(9, 0))]);
        assert!(!schedule[0].is_taken);
        assert!(schedule[0].taken_time.is_none());
    }

    #[test]
    fn regeneration_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        add(&store, "Aspirin", Frequency::OnceDaily);
        add(&store, "Metformin", Frequency::TwiceDaily);
        add(&store, "Ibuprofen", Frequency::FourTimesDaily);

        let first = regenerate_for_day(&store, day());
        let second = regenerate_for_day(&store, day());
        assert_eq!(first.len(), 7);
        assert_eq!(pairs(&first), pairs(&second));
        assert!(second.windows(2).all(|w| w[0].scheduled_time <= w[1].scheduled_time));
    }

    #[test]
    fn rebuild_discards_taken_state_and_other_days_untouched() {
        let store = SqliteStore::open_in_memory().unwrap();
        let med = add(&store, "Aspirin", Frequency::OnceDaily);
        let tomorrow = day().succ_opt().unwrap();
        regenerate_for_day(&store, tomorrow);

        let schedule = regenerate_for_day(&store, day());
        toggle_dosage(&store, &schedule[0].id, at(9, 5)).unwrap();
        let rebuilt = regenerate_for_day(&store, day());

        assert!(!rebuilt[0].is_taken);
        assert_eq!(dosages_for_day(&store, tomorrow).len(), 1);
        assert_eq!(rebuilt[0].medicine_id, med.id);
    }

    #[test]
    fn inactive_medicines_get_no_doses() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut med = add(&store, "Aspirin", Frequency::ThreeTimesDaily);
        med.is_active = false;
        store.update_medicine(&med).unwrap();

        assert!(regenerate_for_day(&store, day()).is_empty());
    }

    #[test]
    fn toggle_twice_restores_pending_and_logs_both() {
        let store = SqliteStore::open_in_memory().unwrap();
        add(&store, "Metformin", Frequency::TwiceDaily);
        let schedule = regenerate_for_day(&store, day());
        let evening = &schedule[1];

        let taken = toggle_dosage(&store, &evening.id, at(21, 2)).unwrap().unwrap();
        assert!(taken.is_taken);
        assert_eq!(taken.taken_time, Some(at(21, 2)));

        let undone = toggle_dosage(&store, &evening.id, at(21, 3)).unwrap().unwrap();
        assert!(!undone.is_taken);
        assert!(undone.taken_time.is_none());

        let items = store.query_history(&HistoryFilter::default()).unwrap();
        let actions: Vec<&str> = items.iter().map(|i| i.entry.action.as_str()).collect();
        assert_eq!(actions, vec!["Dosage marked as not taken", "Dosage taken"]);
        assert_eq!(items[0].entry.notes, "Dosage at 9:00 PM");
    }

    #[test]
    fn toggle_missing_dose_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(toggle_dosage(&store, &Uuid::new_v4(), at(9, 0)).unwrap().is_none());
    }
}
