//! User settings persisted as key/value preferences.
//!
//! The core stores these and hands them back; nothing else reads them.

use crate::db::{DatabaseError, MedicineStore};
use crate::models::AppSettings;

const KEY_NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
const KEY_REMINDER_TIME: &str = "reminder_time";
const KEY_USER_NAME: &str = "user_name";
const KEY_EMERGENCY_CONTACT: &str = "emergency_contact";

/// Loads settings; absent or unparseable keys take their defaults.
pub fn load_settings<S: MedicineStore>(store: &S) -> Result<AppSettings, DatabaseError> {
    let mut settings = AppSettings::default();

    if let Some(raw) = store.get_preference(KEY_NOTIFICATIONS_ENABLED)? {
        match raw.parse::<bool>() {
            Ok(enabled) => settings.notifications_enabled = enabled,
            Err(_) => tracing::warn!(value = %raw, "Ignoring invalid notifications_enabled preference"),
        }
    }
    if let Some(time) = store.get_preference(KEY_REMINDER_TIME)? {
        settings.reminder_time = time;
    }
    if let Some(name) = store.get_preference(KEY_USER_NAME)? {
        settings.user_name = name;
    }
    if let Some(contact) = store.get_preference(KEY_EMERGENCY_CONTACT)? {
        settings.emergency_contact = contact;
    }
    Ok(settings)
}

pub fn save_settings<S: MedicineStore>(store: &S, settings: &AppSettings) -> Result<(), DatabaseError> {
    store.with_transaction(|s| {
        s.set_preference(
            KEY_NOTIFICATIONS_ENABLED,
            &settings.notifications_enabled.to_string(),
        )?;
        s.set_preference(KEY_REMINDER_TIME, &settings.reminder_time)?;
        s.set_preference(KEY_USER_NAME, &settings.user_name)?;
        s.set_preference(KEY_EMERGENCY_CONTACT, &settings.emergency_contact)
    })?;
    tracing::info!("Settings saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;

    #[test]
    fn defaults_when_nothing_stored() {
        let store = SqliteStore::open_in_memory().unwrap();
        let settings = load_settings(&store).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert!(settings.notifications_enabled);
        assert_eq!(settings.reminder_time, "09:00");
    }

    #[test]
    fn save_then_load() {
        let store = SqliteStore::open_in_memory().unwrap();
        let settings = AppSettings {
            notifications_enabled: false,
            reminder_time: "07:45".into(),
            user_name: "Sam".into(),
            emergency_contact: "+1 555 0100".into(),
        };
        save_settings(&store, &settings).unwrap();
        assert_eq!(load_settings(&store).unwrap(), settings);
    }

    #[test]
    fn invalid_flag_falls_back_to_default() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_preference("notifications_enabled", "sometimes").unwrap();
        assert!(load_settings(&store).unwrap().notifications_enabled);
    }
}
