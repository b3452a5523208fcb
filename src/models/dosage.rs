use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scheduled dose of one medicine on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosageInstance {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub scheduled_time: NaiveDateTime,
    pub is_taken: bool,
    pub taken_time: Option<NaiveDateTime>,
}

impl DosageInstance {
    /// A not-yet-taken dose.
    pub fn pending(medicine_id: Uuid, scheduled_time: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            medicine_id,
            scheduled_time,
            is_taken: false,
            taken_time: None,
        }
    }

    /// Flips the taken flag. `taken_time` is set to `now` when the dose
    /// becomes taken and cleared when it becomes untaken.
    pub fn toggle_taken(&mut self, now: NaiveDateTime) {
        self.is_taken = !self.is_taken;
        self.taken_time = if self.is_taken { Some(now) } else { None };
    }
}
