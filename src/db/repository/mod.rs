//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`, one sub-module per table.
//! Timestamps are local wall-clock text with millisecond precision so that
//! string order equals chronological order.

mod dosage;
mod history;
mod medicine;
mod preference;

use chrono::NaiveDateTime;
use rusqlite::types::ToSql;
use rusqlite::Connection;
use uuid::Uuid;

use super::DatabaseError;

pub use dosage::*;
pub use history::*;
pub use medicine::*;
pub use preference::*;

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub(crate) type SqlParams = Vec<Box<dyn ToSql>>;

/// Appends a bound value and returns its `?N` placeholder index.
pub(crate) fn bind(params_vec: &mut SqlParams, value: impl ToSql + 'static) -> usize {
    params_vec.push(Box::new(value));
    params_vec.len()
}

pub(crate) fn to_db_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn from_db_timestamp(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| DatabaseError::InvalidValue(format!("Invalid timestamp '{s}': {e}")))
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::InvalidValue(e.to_string()))
}

/// Removes every medicine, dosage instance and history entry.
/// Preferences are kept. Callers wrap this in a transaction.
pub fn delete_all_records(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "DELETE FROM dosage_instances;
         DELETE FROM history_entries;
         DELETE FROM medicines;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::*;
    use crate::models::*;
    use chrono::NaiveDate;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn ts(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn make_medicine(conn: &Connection, name: &str, refill: Option<NaiveDateTime>) -> Medicine {
        let mut input = MedicineInput::new(name, "100mg");
        input.refill_date = refill;
        let med = input.into_medicine(ts(17, 8, 0));
        insert_medicine(conn, &med).unwrap();
        med
    }

    #[test]
    fn timestamp_round_trip_keeps_millis() {
        let t = ts(17, 9, 30) + chrono::Duration::milliseconds(250);
        let s = to_db_timestamp(&t);
        assert_eq!(s, "2025-06-17 09:30:00.250");
        assert_eq!(from_db_timestamp(&s).unwrap(), t);
    }

    #[test]
    fn timestamp_without_millis_rejected() {
        // Would sort before "2025-06-17 09:30:00.000" and break range bounds.
        assert!(from_db_timestamp("2025-06-17 09:30:00").is_err());
        assert!(from_db_timestamp("17/06/2025").is_err());
    }

    #[test]
    fn stored_refill_without_millis_fails_the_read() {
        let conn = test_db();
        let med = make_medicine(&conn, "Aspirin", Some(ts(17, 9, 0)));
        conn.execute(
            "UPDATE medicines SET refill_date = '2025-06-17 09:00:00' WHERE id = ?1",
            [med.id.to_string()],
        )
        .unwrap();
        assert!(matches!(
            get_medicine(&conn, &med.id).unwrap_err(),
            DatabaseError::InvalidValue(_)
        ));
    }

    #[test]
    fn medicine_insert_and_retrieve_all_fields() {
        let conn = test_db();
        let mut input = MedicineInput::new("Metformin", "500mg");
        input.dosage_form = DosageForm::Capsule;
        input.frequency = Frequency::TwiceDaily;
        input.category = Category::Diabetes;
        input.prescribed_by = "Dr. Brown".into();
        input.instructions = "Take with meals".into();
        input.side_effects = "Nausea".into();
        input.quantity = 60;
        input.refill_date = Some(ts(19, 10, 0));
        let med = input.into_medicine(ts(17, 8, 0));
        insert_medicine(&conn, &med).unwrap();

        let loaded = get_medicine(&conn, &med.id).unwrap().unwrap();
        assert_eq!(loaded, med);
    }

    #[test]
    fn medicine_get_missing_returns_none() {
        let conn = test_db();
        assert!(get_medicine(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn medicine_update_persists_changes() {
        let conn = test_db();
        let mut med = make_medicine(&conn, "Aspirin", None);
        med.dosage = "300mg".into();
        med.is_active = false;
        update_medicine(&conn, &med).unwrap();

        let loaded = get_medicine(&conn, &med.id).unwrap().unwrap();
        assert_eq!(loaded.dosage, "300mg");
        assert!(!loaded.is_active);
    }

    #[test]
    fn medicine_update_missing_is_not_found() {
        let conn = test_db();
        let med = MedicineInput::new("Ghost", "1mg").into_medicine(ts(17, 8, 0));
        let err = update_medicine(&conn, &med).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn medicine_delete_missing_is_not_found() {
        let conn = test_db();
        let err = delete_medicine(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn empty_name_rejected_by_schema() {
        let conn = test_db();
        let med = MedicineInput::new("  ", "1mg").into_medicine(ts(17, 8, 0));
        assert!(insert_medicine(&conn, &med).is_err());
    }

    #[test]
    fn active_filter_sorts_by_name() {
        let conn = test_db();
        make_medicine(&conn, "Zinc", None);
        make_medicine(&conn, "aspirin", None);
        let mut inactive = make_medicine(&conn, "Barley", None);
        inactive.is_active = false;
        update_medicine(&conn, &inactive).unwrap();

        let names: Vec<String> = fetch_medicines(&conn, &MedicineFilter::active())
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["aspirin", "Zinc"]);
        assert_eq!(count_medicines(&conn, &MedicineFilter::active()).unwrap(), 2);
        assert_eq!(count_medicines(&conn, &MedicineFilter::default()).unwrap(), 3);
    }

    #[test]
    fn refill_between_is_inclusive_and_skips_missing_dates() {
        let conn = test_db();
        make_medicine(&conn, "Edge start", Some(ts(17, 12, 0)));
        make_medicine(&conn, "Edge end", Some(ts(20, 12, 0)));
        make_medicine(&conn, "Outside", Some(ts(21, 12, 0)));
        make_medicine(&conn, "No date", None);

        let found = fetch_medicines(
            &conn,
            &MedicineFilter::refill_between(ts(17, 12, 0), ts(20, 12, 0)),
        )
        .unwrap();
        let names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Edge start", "Edge end"]);
    }

    #[test]
    fn refill_before_is_strict() {
        let conn = test_db();
        make_medicine(&conn, "Late", Some(ts(16, 12, 0)));
        make_medicine(&conn, "Exactly now", Some(ts(17, 12, 0)));
        let found = fetch_medicines(&conn, &MedicineFilter::refill_before(ts(17, 12, 0))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Late");
    }

    #[test]
    fn unknown_stored_category_loads_as_none() {
        let conn = test_db();
        let med = make_medicine(&conn, "Mystery", None);
        conn.execute(
            "UPDATE medicines SET category = 'Herbal' WHERE id = ?1",
            [med.id.to_string()],
        )
        .unwrap();
        let loaded = get_medicine(&conn, &med.id).unwrap().unwrap();
        assert!(loaded.category.is_none());

        let active = fetch_medicines(&conn, &MedicineFilter::active()).unwrap();
        let counts = crate::analysis::category_counts(&active);
        assert_eq!(counts.get("Unknown"), Some(&1));
        assert_eq!(counts.get("Herbal"), None);
    }

    #[test]
    fn search_matches_name_or_category_ignoring_case() {
        let conn = test_db();
        let mut vitamin = MedicineInput::new("Vitamin D", "1000 IU");
        vitamin.category = Category::Vitamins;
        insert_medicine(&conn, &vitamin.into_medicine(ts(17, 8, 0))).unwrap();
        let mut ibuprofen = MedicineInput::new("Ibuprofen", "200mg");
        ibuprofen.category = Category::PainRelief;
        insert_medicine(&conn, &ibuprofen.into_medicine(ts(17, 8, 0))).unwrap();
        make_medicine(&conn, "Aspirin", None);

        let search = |q: &str| -> Vec<String> {
            fetch_medicines(&conn, &MedicineFilter::search(q))
                .unwrap()
                .into_iter()
                .map(|m| m.name)
                .collect()
        };
        assert_eq!(search("vitamin"), vec!["Vitamin D"]);
        assert_eq!(search("PAIN"), vec!["Ibuprofen"]);
        assert_eq!(search("iN"), vec!["Aspirin", "Ibuprofen", "Vitamin D"]);
        assert_eq!(search(""), vec!["Aspirin", "Ibuprofen", "Vitamin D"]);
        assert!(search("insulin").is_empty());
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let conn = test_db();
        make_medicine(&conn, "Aspirin", None);
        make_medicine(&conn, "Cream_50%", None);
        let found = fetch_medicines(&conn, &MedicineFilter::search("_50%")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Cream_50%");
        assert_eq!(fetch_medicines(&conn, &MedicineFilter::search("%")).unwrap().len(), 1);
    }

    #[test]
    fn dosages_for_day_sorted_and_deleted_by_filter() {
        let conn = test_db();
        let med = make_medicine(&conn, "Aspirin", None);
        for (d, h) in [(17, 21), (17, 9), (18, 9)] {
            insert_dosage(&conn, &DosageInstance::pending(med.id, ts(d, h, 0))).unwrap();
        }

        let day = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        let today = fetch_dosages(&conn, &DosageFilter::day(day)).unwrap();
        let hours: Vec<String> = today.iter().map(|d| d.scheduled_time.format("%H").to_string()).collect();
        assert_eq!(hours, vec!["09", "21"]);

        assert_eq!(delete_dosages(&conn, &DosageFilter::day(day)).unwrap(), 2);
        assert_eq!(fetch_dosages(&conn, &DosageFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn dosage_update_round_trips_taken_state() {
        let conn = test_db();
        let med = make_medicine(&conn, "Aspirin", None);
        let mut dose = DosageInstance::pending(med.id, ts(17, 9, 0));
        insert_dosage(&conn, &dose).unwrap();

        dose.toggle_taken(ts(17, 9, 4));
        update_dosage(&conn, &dose).unwrap();
        let loaded = get_dosage(&conn, &dose.id).unwrap().unwrap();
        assert!(loaded.is_taken);
        assert_eq!(loaded.taken_time, Some(ts(17, 9, 4)));
    }

    #[test]
    fn history_newest_first_with_dangling_medicine() {
        let conn = test_db();
        let med = make_medicine(&conn, "Aspirin", None);
        for (action, minute) in [("Medicine added", 0), ("Medicine deleted", 5)] {
            insert_history_entry(&conn, &HistoryEntry {
                id: Uuid::new_v4(),
                medicine_id: med.id,
                action: action.into(),
                timestamp: ts(17, 8, minute),
                notes: String::new(),
            })
            .unwrap();
        }
        delete_medicine(&conn, &med.id).unwrap();

        let items = fetch_history(&conn, &HistoryFilter::default()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].entry.action, "Medicine deleted");
        assert_eq!(items[1].entry.action, "Medicine added");
        assert!(items.iter().all(|i| i.medicine_name.is_none()));
    }

    #[test]
    fn history_same_timestamp_later_insert_first() {
        let conn = test_db();
        let med = make_medicine(&conn, "Aspirin", None);
        for action in ["first", "second"] {
            insert_history_entry(&conn, &HistoryEntry {
                id: Uuid::new_v4(),
                medicine_id: med.id,
                action: action.into(),
                timestamp: ts(17, 8, 0),
                notes: String::new(),
            })
            .unwrap();
        }
        let items = fetch_history(&conn, &HistoryFilter { medicine_id: Some(med.id), limit: Some(1) }).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].entry.action, "second");
        assert_eq!(items[0].medicine_name.as_deref(), Some("Aspirin"));
    }

    #[test]
    fn delete_all_records_keeps_preferences() {
        let conn = test_db();
        let med = make_medicine(&conn, "Aspirin", None);
        insert_dosage(&conn, &DosageInstance::pending(med.id, ts(17, 9, 0))).unwrap();
        set_user_preference(&conn, "user_name", "Sam").unwrap();

        delete_all_records(&conn).unwrap();

        assert_eq!(count_medicines(&conn, &MedicineFilter::default()).unwrap(), 0);
        assert!(fetch_dosages(&conn, &DosageFilter::default()).unwrap().is_empty());
        assert_eq!(get_user_preference(&conn, "user_name").unwrap().as_deref(), Some("Sam"));
    }

    #[test]
    fn preference_upsert_overwrites() {
        let conn = test_db();
        assert!(get_user_preference(&conn, "reminder_time").unwrap().is_none());
        set_user_preference(&conn, "reminder_time", "08:00").unwrap();
        set_user_preference(&conn, "reminder_time", "07:30").unwrap();
        assert_eq!(get_user_preference(&conn, "reminder_time").unwrap().as_deref(), Some("07:30"));
    }
}
