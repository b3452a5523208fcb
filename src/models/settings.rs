use serde::{Deserialize, Serialize};

/// User-facing preferences. Stored by the core but never interpreted by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_notifications_enabled")]
    pub notifications_enabled: bool,
    /// HH:MM, 24h
    #[serde(default = "default_reminder_time")]
    pub reminder_time: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub emergency_contact: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            notifications_enabled: default_notifications_enabled(),
            reminder_time: default_reminder_time(),
            user_name: String::new(),
            emergency_contact: String::new(),
        }
    }
}

fn default_notifications_enabled() -> bool {
    true
}

fn default_reminder_time() -> String {
    "09:00".to_string()
}
