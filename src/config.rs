use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Refill";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "refill.db";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "REFILL_DATA_DIR";

/// Get the application data directory.
/// `$REFILL_DATA_DIR` when set, otherwise ~/Refill/ on all platforms.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Path of the SQLite database backing the store
pub fn database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

/// Filter used when `RUST_LOG` is not set
pub fn default_log_filter() -> &'static str {
    "refill=info,refill_lib=info"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with(DATABASE_FILE));
    }

    #[test]
    fn app_name_is_refill() {
        assert_eq!(APP_NAME, "Refill");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_targets_crate() {
        assert!(default_log_filter().contains("refill_lib=info"));
    }
}
