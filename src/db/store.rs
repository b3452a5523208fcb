//! Persistence seam for the medicine tracker.
//!
//! `MedicineStore` is the only storage surface the domain layer sees.
//! `SqliteStore` backs it with a single owned connection; tests can swap in
//! their own implementation to exercise failure handling.

use std::path::Path;

use rusqlite::Connection;
use uuid::Uuid;

use super::repository;
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::*;

pub trait MedicineStore {
    fn insert_medicine(&self, medicine: &Medicine) -> Result<(), DatabaseError>;
    fn update_medicine(&self, medicine: &Medicine) -> Result<(), DatabaseError>;
    fn delete_medicine(&self, id: &Uuid) -> Result<(), DatabaseError>;
    fn get_medicine(&self, id: &Uuid) -> Result<Option<Medicine>, DatabaseError>;
    fn query_medicines(&self, filter: &MedicineFilter) -> Result<Vec<Medicine>, DatabaseError>;
    fn count_medicines(&self, filter: &MedicineFilter) -> Result<u32, DatabaseError>;

    fn insert_dosage(&self, dosage: &DosageInstance) -> Result<(), DatabaseError>;
    fn update_dosage(&self, dosage: &DosageInstance) -> Result<(), DatabaseError>;
    fn get_dosage(&self, id: &Uuid) -> Result<Option<DosageInstance>, DatabaseError>;
    fn query_dosages(&self, filter: &DosageFilter) -> Result<Vec<DosageInstance>, DatabaseError>;
    fn delete_dosages(&self, filter: &DosageFilter) -> Result<usize, DatabaseError>;

    fn insert_history(&self, entry: &HistoryEntry) -> Result<(), DatabaseError>;
    fn query_history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryItem>, DatabaseError>;

    fn get_preference(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set_preference(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Removes medicines, dosages and history. Preferences survive.
    fn delete_all(&self) -> Result<(), DatabaseError>;

    /// Runs `f` atomically: every write inside commits together or not at all.
    /// Must not be nested.
    fn with_transaction<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, DatabaseError>,
    {
        f(self)
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and applies migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_database(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_memory_database()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn close(self) -> Result<(), DatabaseError> {
        self.conn.close().map_err(|(_, e)| DatabaseError::Sqlite(e))
    }
}

impl MedicineStore for SqliteStore {
    fn insert_medicine(&self, medicine: &Medicine) -> Result<(), DatabaseError> {
        repository::insert_medicine(&self.conn, medicine)
    }

    fn update_medicine(&self, medicine: &Medicine) -> Result<(), DatabaseError> {
        repository::update_medicine(&self.conn, medicine)
    }

    fn delete_medicine(&self, id: &Uuid) -> Result<(), DatabaseError> {
        repository::delete_medicine(&self.conn, id)
    }

    fn get_medicine(&self, id: &Uuid) -> Result<Option<Medicine>, DatabaseError> {
        repository::get_medicine(&self.conn, id)
    }

    fn query_medicines(&self, filter: &MedicineFilter) -> Result<Vec<Medicine>, DatabaseError> {
        repository::fetch_medicines(&self.conn, filter)
    }

    fn count_medicines(&self, filter: &MedicineFilter) -> Result<u32, DatabaseError> {
        repository::count_medicines(&self.conn, filter)
    }

    fn insert_dosage(&self, dosage: &DosageInstance) -> Result<(), DatabaseError> {
        repository::insert_dosage(&self.conn, dosage)
    }

    fn update_dosage(&self, dosage: &DosageInstance) -> Result<(), DatabaseError> {
        repository::update_dosage(&self.conn, dosage)
    }

    fn get_dosage(&self, id: &Uuid) -> Result<Option<DosageInstance>, DatabaseError> {
        repository::get_dosage(&self.conn, id)
    }

    fn query_dosages(&self, filter: &DosageFilter) -> Result<Vec<DosageInstance>, DatabaseError> {
        repository::fetch_dosages(&self.conn, filter)
    }

    fn delete_dosages(&self, filter: &DosageFilter) -> Result<usize, DatabaseError> {
        repository::delete_dosages(&self.conn, filter)
    }

    fn insert_history(&self, entry: &HistoryEntry) -> Result<(), DatabaseError> {
        repository::insert_history_entry(&self.conn, entry)
    }

    fn query_history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryItem>, DatabaseError> {
        repository::fetch_history(&self.conn, filter)
    }

    fn get_preference(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        repository::get_user_preference(&self.conn, key)
    }

    fn set_preference(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        repository::set_user_preference(&self.conn, key, value)
    }

    fn delete_all(&self) -> Result<(), DatabaseError> {
        repository::delete_all_records(&self.conn)
    }

    fn with_transaction<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Self) -> Result<T, DatabaseError>,
    {
        let tx = self.conn.unchecked_transaction()?;
        // Dropping `tx` on error rolls back.
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn medicine(name: &str) -> Medicine {
        let created = NaiveDate::from_ymd_opt(2025, 6, 17)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        MedicineInput::new(name, "10mg").into_medicine(created)
    }

    #[test]
    fn transaction_commits_all_writes() {
        let store = store();
        store
            .with_transaction(|s| {
                s.insert_medicine(&medicine("Aspirin"))?;
                s.insert_medicine(&medicine("Vitamin D"))
            })
            .unwrap();
        assert_eq!(store.count_medicines(&MedicineFilter::default()).unwrap(), 2);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let store = store();
        let result: Result<(), DatabaseError> = store.with_transaction(|s| {
            s.insert_medicine(&medicine("Aspirin"))?;
            Err(DatabaseError::Sqlite(rusqlite::Error::InvalidQuery))
        });
        assert!(result.is_err());
        assert_eq!(store.count_medicines(&MedicineFilter::default()).unwrap(), 0);
    }

    #[test]
    fn deleting_medicine_cascades_to_dosages() {
        let store = store();
        let med = medicine("Aspirin");
        store.insert_medicine(&med).unwrap();
        store
            .insert_dosage(&DosageInstance::pending(med.id, med.created_at))
            .unwrap();
        store.delete_medicine(&med.id).unwrap();
        assert!(store.query_dosages(&DosageFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn reopen_file_store_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refill.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_medicine(&medicine("Aspirin")).unwrap();
            store.set_preference("user_name", "Sam").unwrap();
            store.close().unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count_medicines(&MedicineFilter::active()).unwrap(), 1);
        assert_eq!(store.get_preference("user_name").unwrap().as_deref(), Some("Sam"));
    }
}
