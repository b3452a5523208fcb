//! History recorder: append-only audit trail of medicine and dose events.

use chrono::{NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::db::{DatabaseError, MedicineStore};
use crate::models::HistoryEntry;

pub const ACTION_MEDICINE_ADDED: &str = "Medicine added";
pub const ACTION_MEDICINE_UPDATED: &str = "Medicine updated";
pub const ACTION_MEDICINE_DELETED: &str = "Medicine deleted";
pub const ACTION_DOSAGE_TAKEN: &str = "Dosage taken";
pub const ACTION_DOSAGE_NOT_TAKEN: &str = "Dosage marked as not taken";

/// Persists one entry stamped with `now` and returns it.
pub fn append<S: MedicineStore>(
    store: &S,
    medicine_id: Uuid,
    action: &str,
    notes: String,
    now: NaiveDateTime,
) -> Result<HistoryEntry, DatabaseError> {
    let entry = HistoryEntry {
        id: Uuid::new_v4(),
        medicine_id,
        action: action.to_string(),
        timestamp: now,
        notes,
    };
    store.insert_history(&entry)?;
    tracing::debug!(medicine_id = %medicine_id, action, "History entry recorded");
    Ok(entry)
}

pub fn added_notes(name: &str) -> String {
    format!("Added {name} to medication list")
}

pub fn updated_notes(name: &str) -> String {
    format!("Updated details for {name}")
}

pub fn deleted_notes(name: &str) -> String {
    format!("Removed {name} from medication list")
}

/// "Dosage at 9:00 PM"
pub fn dosage_notes(scheduled: NaiveTime) -> String {
    format!("Dosage at {}", scheduled.format("%-I:%M %p"))
}

pub fn dosage_action(is_taken: bool) -> &'static str {
    if is_taken {
        ACTION_DOSAGE_TAKEN
    } else {
        ACTION_DOSAGE_NOT_TAKEN
    }
}
