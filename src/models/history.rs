use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit record. `medicine_id` may dangle once the medicine is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub action: String,
    pub timestamp: NaiveDateTime,
    pub notes: String,
}

/// History entry joined with the medicine's current name, for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub entry: HistoryEntry,
    /// `None` when the medicine has since been deleted.
    pub medicine_name: Option<String>,
}
